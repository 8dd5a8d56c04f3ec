// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte transports the master talks through

use std::io;

#[cfg(feature = "serial")]
pub mod serial;

/// A blocking, exclusively owned byte stream to the slaves.
///
/// RTU frames carry no delimiters, so the master relies on byte
/// counts and on the read timeout of the transport alone.
pub trait Transport {
    /// Writes a complete request frame.
    ///
    /// Returns the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Reads whatever is available into `buf`.
    ///
    /// Blocks at most for the configured read timeout and returns `0`
    /// if nothing arrived in time.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Drops stale input, e.g. leftovers of a previous response,
    /// before a new request is sent.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Releases the underlying resource.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
