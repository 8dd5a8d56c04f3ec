// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial line settings and the single character selectors used by
//! foreign callers to pick them.

use std::{fmt, str::FromStr, time::Duration};

use crate::{CrcOrder, Error, Result};

/// Parity bit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl Parity {
    /// Parses `'n'`, `'o'` or `'e'`.
    ///
    /// # Errors
    ///
    /// Any other selector is a configuration error.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            b'n' => Ok(Self::None),
            b'o' => Ok(Self::Odd),
            b'e' => Ok(Self::Even),
            _ => Err(Error::Configuration("invalid parity".to_owned())),
        }
    }
}

impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "none" => Ok(Self::None),
            "o" | "odd" => Ok(Self::Odd),
            "e" | "even" => Ok(Self::Even),
            _ => Err(Error::Configuration(format!("invalid parity: {s}"))),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Odd => "odd",
            Self::Even => "even",
        };
        f.write_str(s)
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl StopBits {
    /// Parses `1`, `2` or `15` (for 1.5).
    ///
    /// # Errors
    ///
    /// Any other selector is a configuration error.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Self::One),
            15 => Ok(Self::OnePointFive),
            2 => Ok(Self::Two),
            _ => Err(Error::Configuration("invalid stop bits".to_owned())),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::One => "1",
            Self::OnePointFive => "1.5",
            Self::Two => "2",
        };
        f.write_str(s)
    }
}

impl CrcOrder {
    /// Parses `'>'` (big endian) or `'<'` (little endian).
    ///
    /// # Errors
    ///
    /// Any other selector is a configuration error.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            b'>' => Ok(Self::BigEndian),
            b'<' => Ok(Self::LittleEndian),
            _ => Err(Error::Configuration("invalid CRC order".to_owned())),
        }
    }
}

/// Settings for opening a serial line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub read_timeout: Duration,
}

impl SerialConfig {
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
    pub const DEFAULT_DATA_BITS: u8 = 8;
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

    /// 9600 baud, 8N1 and a read timeout of one second.
    #[must_use]
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            data_bits: Self::DEFAULT_DATA_BITS,
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
        }
    }

    /// Builds the settings from raw selector values.
    ///
    /// The read timeout is given in whole seconds.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] on an invalid parity,
    /// stop bit or data bit selector.
    pub fn from_selectors(
        port_name: &str,
        baud_rate: u32,
        data_bits: u8,
        parity: u8,
        stop_bits: u8,
        read_timeout_secs: u32,
    ) -> Result<Self> {
        let config = Self {
            port_name: port_name.to_owned(),
            baud_rate,
            data_bits,
            parity: Parity::from_selector(parity)?,
            stop_bits: StopBits::from_selector(stop_bits)?,
            read_timeout: Duration::from_secs(read_timeout_secs.into()),
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    #[must_use]
    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    #[must_use]
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Checks the settings before any port is touched.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] for data bits outside `5..=8`,
    /// an empty port name or a zero baud rate.
    pub fn validate(&self) -> Result<()> {
        if self.port_name.is_empty() {
            return Err(Error::Configuration("empty port name".to_owned()));
        }
        if self.baud_rate == 0 {
            return Err(Error::Configuration("invalid baud rate: 0".to_owned()));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(Error::Configuration(format!(
                "invalid data bits: {}",
                self.data_bits
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SerialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} baud, {} data bits, parity {}, {} stop bits, timeout {:?}",
            self.port_name,
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits,
            self.read_timeout
        )
    }
}
