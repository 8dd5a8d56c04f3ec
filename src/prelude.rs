// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::{CrcOrder, Request, RequestAdu};
pub use crate::{Error, ExceptionCode, ExceptionResponse, ProtocolError, Result};
pub use crate::{Exchange, Master};
pub use crate::{Parity, SerialConfig, StopBits};
pub use crate::{Slave, SlaveId};

#[cfg(feature = "serial")]
pub use crate::transport::serial::SerialTransport;

///////////////////////////////////////////////////////////////////
/// Functions
///////////////////////////////////////////////////////////////////
pub use crate::{decode_words, pack_coils, unpack_coils};

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
pub use crate::transport::Transport;
