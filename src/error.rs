// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error;

use crate::{ExceptionResponse, FunctionCode};

/// Error type of a single master exchange.
///
/// Every error aborts the exchange it occurred in. Nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid configuration value was rejected before any I/O happened.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Opening, reading from or writing to the transport failed.
    #[error(transparent)]
    Transport(#[from] io::Error),

    /// The transport delivered no data within its read timeout.
    #[error("read timeout")]
    Timeout,

    /// The CRC of the received frame is not correct.
    #[error("validate failed: received CRC 0x{received:04X}, calculated CRC 0x{calculated:04X}")]
    Checksum { received: u16, calculated: u16 },

    /// The received frame doesn't belong to the outstanding request.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The slave responded with a known _Modbus_ exception.
    #[error("exception: {0}")]
    Exception(#[from] ExceptionResponse),

    /// A write carries more items than fit into a single RTU frame.
    #[error("{quantity} items exceed the limit of {max} for Modbus function {function}")]
    QuantityOutOfRange {
        function: FunctionCode,
        quantity: usize,
        max: usize,
    },

    /// The slave responded with an exception code outside the known set.
    #[error("unknown exception code 0x{code:02X} (Modbus function {function})")]
    UnknownException { function: FunctionCode, code: u8 },
}

/// Violations of the request/response correlation.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The function code of the response matches neither the request
    /// nor its exception form.
    #[error("function code mismatch: expected/request = {request}, actual/response = {response}")]
    FunctionCodeMismatch { request: FunctionCode, response: u8 },

    /// The byte count of a read response exceeds the received frame.
    #[error("byte count {byte_count} exceeds the {available} bytes received")]
    ByteCountMismatch { byte_count: u8, available: usize },

    /// The frame is too short to be a Modbus RTU response.
    #[error("frame too short: {len} bytes")]
    FrameTooShort { len: usize },

    /// A response was requested without writing a request first.
    #[error("no request pending")]
    NoRequestPending,
}
