// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A blocking [Modbus](https://en.wikipedia.org/wiki/Modbus) RTU master
//! for serial lines.
//!
//! The master writes one request frame at a time and reads the
//! response to it through a [`Transport`](transport::Transport).
//! Exchanges are serialized internally, so a single [`Master`] can be
//! shared between threads.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rtu-master = "*"
//! ```
//!
//! The `serial` feature (enabled by default) provides a transport
//! for serial ports.
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     use rtu_master::prelude::*;
//!
//!     let config = SerialConfig::new("/dev/ttyUSB0").baud_rate(19200);
//!     let master = Master::open(&config)?;
//!
//!     let mut buf = [0; 4];
//!     let n = master.read_holding_registers(&mut buf, Slave(1), 0x082B, 2, CrcOrder::default())?;
//!     println!("Registers: {:?}", decode_words(&buf[..n])?);
//!
//!     master.close()?;
//!     Ok(())
//! }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

pub mod prelude;
pub mod transport;

mod codec;
pub use self::codec::{
    crc::crc16,
    decode_words, expected_response_len, pack_coils,
    MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
    rtu::{encode_request_adu, parse_response, verify_crc},
    unpack_coils,
};

mod config;
pub use self::config::{Parity, SerialConfig, StopBits};

mod error;
pub use self::error::{Error, ProtocolError};

mod frame;
pub use self::frame::{
    rtu::{RequestAdu, RequestContext},
    Address, Coil, CrcOrder, ExceptionCode, ExceptionResponse, FunctionCode, Quantity, Request,
    Word,
};

mod master;
pub use self::master::{Exchange, Master};

mod slave;
pub use self::slave::{Slave, SlaveId};

/// Specialized [`std::result::Result`] type for master exchanges.
pub type Result<T> = std::result::Result<T, Error>;
