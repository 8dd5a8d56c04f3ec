// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU master

use std::{
    borrow::Cow,
    io,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    codec::rtu::{encode_request_adu, is_exception, parse_response, verify_crc, MIN_RESPONSE_LEN},
    error::{Error, ProtocolError},
    frame::{rtu::*, *},
    slave::Slave,
    transport::Transport,
    Result,
};

/// _Modbus_ RTU master.
///
/// Owns the transport exclusively. Every exchange (request and
/// response) runs under an internal lock, so a master can be shared
/// between threads and concurrent calls never interleave on the wire.
#[derive(Debug)]
pub struct Master<T> {
    session: Mutex<Session<T>>,
}

#[derive(Debug)]
struct Session<T> {
    transport: T,
    pending: Option<RequestContext>,
}

/// Exclusive access to the master for a single exchange.
///
/// Obtained from [`Master::exchange`]. The lock is released when the
/// guard is dropped.
#[derive(Debug)]
pub struct Exchange<'a, T> {
    session: MutexGuard<'a, Session<T>>,
}

impl<T> Master<T> {
    pub fn new(transport: T) -> Self {
        Self {
            session: Mutex::new(Session {
                transport,
                pending: None,
            }),
        }
    }

    /// Waits until no other exchange is in progress and locks the master.
    pub fn exchange(&self) -> Exchange<'_, T> {
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A request written in an earlier, abandoned exchange
        // must not be matched against a response of this one.
        session.pending = None;
        Exchange { session }
    }

    /// Returns the transport.
    pub fn into_transport(self) -> T {
        self.into_session().transport
    }

    fn into_session(self) -> Session<T> {
        self.session
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Master<T> {
    /// Closes the transport.
    ///
    /// Consumes the master, so no exchange can be outstanding.
    ///
    /// # Errors
    ///
    /// Fails if the transport reports an error while closing.
    pub fn close(self) -> Result<()> {
        let mut session = self.into_session();
        session.transport.close()?;
        Ok(())
    }

    /// Sends `request` to `slave` and receives the response.
    ///
    /// The payload of read responses is copied into `buf` and the number
    /// of copied bytes is returned. Writes always return `0`.
    ///
    /// # Errors
    ///
    /// Any failure aborts the exchange. Nothing is retried.
    pub fn call(
        &self,
        buf: &mut [u8],
        slave: Slave,
        request: Request<'_>,
        crc_order: CrcOrder,
    ) -> Result<usize> {
        let mut exchange = self.exchange();
        exchange.send_request(slave, request, crc_order)?;
        exchange.recv_response(buf)
    }

    /// Read multiple coils (0x01)
    pub fn read_coils(
        &self,
        buf: &mut [u8],
        slave: Slave,
        addr: Address,
        cnt: Quantity,
        crc_order: CrcOrder,
    ) -> Result<usize> {
        self.call(buf, slave, Request::ReadCoils(addr, cnt), crc_order)
    }

    /// Read multiple discrete inputs (0x02)
    pub fn read_discrete_inputs(
        &self,
        buf: &mut [u8],
        slave: Slave,
        addr: Address,
        cnt: Quantity,
        crc_order: CrcOrder,
    ) -> Result<usize> {
        self.call(buf, slave, Request::ReadDiscreteInputs(addr, cnt), crc_order)
    }

    /// Read multiple holding registers (0x03)
    pub fn read_holding_registers(
        &self,
        buf: &mut [u8],
        slave: Slave,
        addr: Address,
        cnt: Quantity,
        crc_order: CrcOrder,
    ) -> Result<usize> {
        self.call(buf, slave, Request::ReadHoldingRegisters(addr, cnt), crc_order)
    }

    /// Read multiple input registers (0x04)
    pub fn read_input_registers(
        &self,
        buf: &mut [u8],
        slave: Slave,
        addr: Address,
        cnt: Quantity,
        crc_order: CrcOrder,
    ) -> Result<usize> {
        self.call(buf, slave, Request::ReadInputRegisters(addr, cnt), crc_order)
    }

    /// Write a single coil (0x05)
    pub fn write_single_coil(
        &self,
        slave: Slave,
        addr: Address,
        coil: Coil,
        crc_order: CrcOrder,
    ) -> Result<()> {
        self.write(slave, Request::WriteSingleCoil(addr, coil), crc_order)
    }

    /// Write a single holding register (0x06)
    pub fn write_single_register(
        &self,
        slave: Slave,
        addr: Address,
        word: Word,
        crc_order: CrcOrder,
    ) -> Result<()> {
        self.write(slave, Request::WriteSingleRegister(addr, word), crc_order)
    }

    /// Write multiple coils (0x0F)
    ///
    /// At most [`MAX_WRITE_COILS`](crate::MAX_WRITE_COILS) coils fit into
    /// one request, more fail with [`Error::QuantityOutOfRange`] before
    /// anything is sent.
    pub fn write_multiple_coils(
        &self,
        slave: Slave,
        addr: Address,
        coils: &[Coil],
        crc_order: CrcOrder,
    ) -> Result<()> {
        self.write(
            slave,
            Request::WriteMultipleCoils(addr, Cow::Borrowed(coils)),
            crc_order,
        )
    }

    /// Write multiple holding registers (0x10)
    ///
    /// At most [`MAX_WRITE_REGISTERS`](crate::MAX_WRITE_REGISTERS) registers
    /// fit into one request, more fail with [`Error::QuantityOutOfRange`]
    /// before anything is sent.
    pub fn write_multiple_registers(
        &self,
        slave: Slave,
        addr: Address,
        words: &[Word],
        crc_order: CrcOrder,
    ) -> Result<()> {
        self.write(
            slave,
            Request::WriteMultipleRegisters(addr, Cow::Borrowed(words)),
            crc_order,
        )
    }

    /// Write multiple holding registers (0x10) using a 16 bit byte count
    ///
    /// See [`Request::WriteMultipleRegistersWide`]. The register limit
    /// of [`Master::write_multiple_registers`] applies as well.
    pub fn write_multiple_registers_wide(
        &self,
        slave: Slave,
        addr: Address,
        words: &[Word],
        crc_order: CrcOrder,
    ) -> Result<()> {
        self.write(
            slave,
            Request::WriteMultipleRegistersWide(addr, Cow::Borrowed(words)),
            crc_order,
        )
    }

    fn write(&self, slave: Slave, request: Request<'_>, crc_order: CrcOrder) -> Result<()> {
        self.call(&mut [], slave, request, crc_order).map(|_| ())
    }
}

impl<T: Transport> Exchange<'_, T> {
    /// Writes the request frame and remembers what the response
    /// must look like.
    ///
    /// A request sent before in this exchange is forgotten.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::QuantityOutOfRange`] if the request doesn't fit
    /// into a frame and with [`Error::Transport`] if the frame can't be
    /// written.
    pub fn send_request(
        &mut self,
        slave: Slave,
        request: Request<'_>,
        crc_order: CrcOrder,
    ) -> Result<()> {
        log::debug!("Call {:?} on slave {}", request, slave);
        if !slave.is_single_device() {
            log::warn!("Slave address {slave} is not a single device, a response is unlikely");
        }

        let session = &mut *self.session;
        session.pending = None;

        let adu = RequestAdu::new(slave, request);
        let frame = encode_request_adu(&adu, crc_order)?;
        log::debug!("Send {:02X?}", frame.as_ref());

        session.transport.discard_input()?;
        let written = session.transport.write(&frame)?;
        if written != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("{written} of {} request bytes written", frame.len()),
            )
            .into());
        }

        session.pending = Some(adu.context(crc_order));
        Ok(())
    }

    /// Receives and decodes the response to the request sent before.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::NoRequestPending`] if no request has
    /// been sent, with [`Error::Timeout`] if the slave falls silent and
    /// otherwise as described for [`parse_response`].
    pub fn recv_response(&mut self, buf: &mut [u8]) -> Result<usize> {
        let session = &mut *self.session;
        let Some(context) = session.pending.take() else {
            return Err(ProtocolError::NoRequestPending.into());
        };

        let frame = read_frame(&mut session.transport, &context)?;
        log::debug!("Received {:02X?}", frame);

        let adu = verify_crc(&frame, context.crc_order())?;
        parse_response(buf, adu, context.function_code())
    }

    /// The request awaiting its response, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&RequestContext> {
        self.session.pending.as_ref()
    }
}

/// Accumulates a response frame.
///
/// Reads until an exception can be told apart from a regular
/// response, then until the expected length if it is not an
/// exception.
fn read_frame<T: Transport>(transport: &mut T, context: &RequestContext) -> Result<Vec<u8>> {
    let mut raw = vec![0; context.expected_len().max(MIN_RESPONSE_LEN)];
    let mut len = 0;

    while len < MIN_RESPONSE_LEN {
        len += read_some(transport, &mut raw[len..])?;
    }

    if is_exception(&raw[..len], context.function_code()) {
        log::debug!(
            "Exception response from slave {} to function {}",
            context.slave(),
            context.function_code()
        );
    } else {
        while len < context.expected_len() {
            len += read_some(transport, &mut raw[len..])?;
        }
    }

    raw.truncate(len);
    Ok(raw)
}

fn read_some<T: Transport>(transport: &mut T, buf: &mut [u8]) -> Result<usize> {
    let n = transport.read(buf)?;
    if n == 0 {
        return Err(Error::Timeout);
    }
    log::trace!("Read {n} bytes");
    Ok(n)
}
