// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory transports shared by the integration tests.

#![allow(dead_code)]

use std::{collections::VecDeque, io};

use rtu_master::{crc16, transport::Transport, ExceptionCode, FunctionCode};

/// Appends the CRC, low byte first.
pub fn with_crc(frame: &[u8]) -> Vec<u8> {
    let mut frame = frame.to_vec();
    frame.extend_from_slice(&crc16(&frame).to_le_bytes());
    frame
}

/// Replays canned chunks and records everything written.
///
/// Once all chunks are consumed every read times out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub written: Vec<Vec<u8>>,
    pub reads: usize,
    pub discarded: usize,
    pub closed: bool,
    chunks: VecDeque<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.push(buf.to_vec());
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.discarded += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Answers a request PDU with the response data following the
/// function code or with an exception.
pub type Handler = Box<dyn FnMut(FunctionCode, &[u8]) -> Result<Vec<u8>, ExceptionCode> + Send>;

/// A slave on the other end of the line.
///
/// Every written request is checked and answered immediately. The
/// answer is delivered in reads of at most `chunk_len` bytes.
pub struct SimulatedSlave {
    pub id: u8,
    pub requests: Vec<Vec<u8>>,
    chunk_len: usize,
    pending: VecDeque<u8>,
    handler: Handler,
}

impl std::fmt::Debug for SimulatedSlave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSlave")
            .field("id", &self.id)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl SimulatedSlave {
    pub fn new(id: u8, handler: Handler) -> Self {
        Self {
            id,
            requests: Vec::new(),
            chunk_len: usize::MAX,
            pending: VecDeque::new(),
            handler,
        }
    }

    pub fn chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len;
        self
    }

    fn respond(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        let (adu, crc) = frame.split_at(frame.len().checked_sub(2)?);
        if u16::from_le_bytes([crc[0], crc[1]]) != crc16(adu) || adu.first() != Some(&self.id) {
            return None;
        }
        let function = FunctionCode::new(*adu.get(1)?)?;
        let mut response = vec![self.id];
        match (self.handler)(function, &adu[2..]) {
            Ok(data) => {
                response.push(function.value());
                response.extend_from_slice(&data);
            }
            Err(exception) => {
                response.push(function.exception_value());
                response.push(exception.into());
            }
        }
        Some(with_crc(&response))
    }
}

impl Transport for SimulatedSlave {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.requests.push(buf.to_vec());
        if let Some(response) = self.respond(buf) {
            self.pending.extend(response);
        }
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.pending.len().min(buf.len()).min(self.chunk_len);
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}

/// A device with 64 coils and 64 registers.
///
/// Discrete inputs mirror the coils and input registers mirror the
/// holding registers. Accesses outside the memory are rejected with
/// [`ExceptionCode::IllegalDataAddress`].
pub fn memory_device() -> Handler {
    const SIZE: usize = 64;
    let mut coils = [false; SIZE];
    let mut registers = [0u16; SIZE];

    Box::new(move |function, data| {
        let word = |i: usize| -> Result<u16, ExceptionCode> {
            data.get(i..i + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or(ExceptionCode::IllegalDataValue)
        };
        let addr = usize::from(word(0)?);
        let value = word(2)?;
        let range = |cnt: usize| {
            if addr + cnt <= SIZE {
                Ok(addr..addr + cnt)
            } else {
                Err(ExceptionCode::IllegalDataAddress)
            }
        };
        let echo = data[..4].to_vec();

        match function {
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs => {
                let cnt = usize::from(value);
                let mut packed = vec![0u8; (cnt + 7) / 8];
                for (i, coil) in coils[range(cnt)?].iter().enumerate() {
                    packed[i / 8] |= u8::from(*coil) << (i % 8);
                }
                let mut res = vec![packed.len() as u8];
                res.extend(packed);
                Ok(res)
            }
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                let cnt = usize::from(value);
                let mut res = vec![(cnt * 2) as u8];
                for w in &registers[range(cnt)?] {
                    res.extend_from_slice(&w.to_be_bytes());
                }
                Ok(res)
            }
            FunctionCode::WriteSingleCoil => {
                let state = match value {
                    0xFF00 => true,
                    0x0000 => false,
                    _ => return Err(ExceptionCode::IllegalDataValue),
                };
                coils[range(1)?.start] = state;
                Ok(echo)
            }
            FunctionCode::WriteSingleRegister => {
                registers[range(1)?.start] = value;
                Ok(echo)
            }
            FunctionCode::WriteMultipleCoils => {
                let cnt = usize::from(value);
                let packed = data.get(5..).ok_or(ExceptionCode::IllegalDataValue)?;
                if usize::from(data[4]) != packed.len() || packed.len() != (cnt + 7) / 8 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                for (i, coil) in coils[range(cnt)?].iter_mut().enumerate() {
                    *coil = (packed[i / 8] >> (i % 8)) & 1 == 1;
                }
                Ok(echo)
            }
            FunctionCode::WriteMultipleRegisters => {
                let cnt = usize::from(value);
                // Some devices expect a 16 bit byte count.
                let offset = if data.len() == 6 + cnt * 2 { 6 } else { 5 };
                let payload = &data[offset.min(data.len())..];
                if payload.len() != cnt * 2 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                for (i, reg) in registers[range(cnt)?].iter_mut().enumerate() {
                    *reg = u16::from_be_bytes([payload[2 * i], payload[2 * i + 1]]);
                }
                Ok(echo)
            }
        }
    })
}
