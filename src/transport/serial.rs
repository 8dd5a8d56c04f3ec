// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial line transport

use std::{
    fmt,
    io::{self, Read as _, Write as _},
};

use tokio_serial::{ClearBuffer, DataBits, SerialPort};

use crate::{
    config::{Parity, SerialConfig, StopBits},
    Error, Master, Result,
};

use super::Transport;

/// A serial port opened in blocking mode.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.port.name())
            .finish()
    }
}

impl SerialTransport {
    /// Opens the serial port described by `config`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] for settings the driver
    /// can't express and with [`Error::Transport`] if the port can't
    /// be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        config.validate()?;
        let builder = tokio_serial::new(config.port_name.as_str(), config.baud_rate)
            .data_bits(data_bits(config.data_bits)?)
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits)?)
            .timeout(config.read_timeout);
        let port = builder.open().map_err(io::Error::from)?;
        log::debug!("Opened serial port {config}");
        Ok(Self { port })
    }

    /// Wraps an already opened port.
    #[must_use]
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

fn data_bits(data_bits: u8) -> Result<DataBits> {
    match data_bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(Error::Configuration(format!(
            "invalid data bits: {data_bits}"
        ))),
    }
}

fn parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Odd => tokio_serial::Parity::Odd,
        Parity::Even => tokio_serial::Parity::Even,
    }
}

fn stop_bits(stop_bits: StopBits) -> Result<tokio_serial::StopBits> {
    match stop_bits {
        StopBits::One => Ok(tokio_serial::StopBits::One),
        StopBits::Two => Ok(tokio_serial::StopBits::Two),
        StopBits::OnePointFive => Err(Error::Configuration(
            "1.5 stop bits are not supported by the serial driver".to_owned(),
        )),
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(0),
            res => res,
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn close(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Master<SerialTransport> {
    /// Opens the serial port described by `config` and attaches
    /// a master to it.
    ///
    /// # Errors
    ///
    /// See [`SerialTransport::open`].
    pub fn open(config: &SerialConfig) -> Result<Self> {
        SerialTransport::open(config).map(Self::new)
    }
}
