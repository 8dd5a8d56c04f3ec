// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::{self, Cursor};

use byteorder::{BigEndian, ReadBytesExt as _};
use bytes::{BufMut as _, BytesMut};

use crate::{
    frame::{Coil, Quantity, Request, Word},
    Error, Result,
};

pub(crate) mod crc;
pub(crate) mod rtu;

/// Most coils a single write multiple coils request can carry.
pub const MAX_WRITE_COILS: usize = 0x07B0;

/// Most registers a single write multiple registers request can carry,
/// with either byte count width.
pub const MAX_WRITE_REGISTERS: usize = 0x007B;

/// Address, function code and CRC.
const ADU_OVERHEAD: usize = 1 + 1 + 2;

/// Length of every successful write acknowledgement: address, function
/// code, echoed address, echoed value/quantity and CRC.
const WRITE_RESPONSE_LEN: usize = ADU_OVERHEAD + 2 + 2;

#[allow(clippy::cast_possible_truncation)]
fn u16_len(len: usize) -> u16 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
fn u8_len(len: usize) -> u8 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u8::MAX.into());
    len as u8
}

pub(crate) fn encode_request_pdu(buf: &mut BytesMut, request: &Request<'_>) {
    use crate::frame::Request::*;
    buf.put_u8(request.function_code().value());
    match request {
        ReadCoils(address, quantity)
        | ReadDiscreteInputs(address, quantity)
        | ReadInputRegisters(address, quantity)
        | ReadHoldingRegisters(address, quantity) => {
            buf.put_u16(*address);
            buf.put_u16(*quantity);
        }
        WriteSingleCoil(address, state) => {
            buf.put_u16(*address);
            buf.put_u16(bool_to_coil(*state));
        }
        WriteSingleRegister(address, word) => {
            buf.put_u16(*address);
            buf.put_u16(*word);
        }
        WriteMultipleCoils(address, coils) => {
            buf.put_u16(*address);
            buf.put_u16(u16_len(coils.len()));
            buf.put_u8(u8_len(packed_coils_size(coils)));
            encode_packed_coils(buf, coils);
        }
        WriteMultipleRegisters(address, words) => {
            buf.put_u16(*address);
            let len = words.len();
            buf.put_u16(u16_len(len));
            buf.put_u8(u8_len(len * 2));
            for w in words.as_ref() {
                buf.put_u16(*w);
            }
        }
        WriteMultipleRegistersWide(address, words) => {
            buf.put_u16(*address);
            let len = words.len();
            buf.put_u16(u16_len(len));
            buf.put_u16(u16_len(len * 2));
            for w in words.as_ref() {
                buf.put_u16(*w);
            }
        }
    }
}

/// Rejects writes whose payload doesn't fit into one frame, so the
/// length fields always match the data.
pub(crate) fn check_quantity(request: &Request<'_>) -> Result<()> {
    use crate::frame::Request::*;
    let (quantity, max) = match request {
        WriteMultipleCoils(_, coils) => (coils.len(), MAX_WRITE_COILS),
        WriteMultipleRegisters(_, words) | WriteMultipleRegistersWide(_, words) => {
            (words.len(), MAX_WRITE_REGISTERS)
        }
        _ => return Ok(()),
    };
    if quantity > max {
        return Err(Error::QuantityOutOfRange {
            function: request.function_code(),
            quantity,
            max,
        });
    }
    Ok(())
}

/// Length of the serialized request frame including address and CRC.
pub(crate) fn expected_request_len(request: &Request<'_>) -> usize {
    use crate::frame::Request::*;
    let data_len = match request {
        ReadCoils(_, _)
        | ReadDiscreteInputs(_, _)
        | ReadHoldingRegisters(_, _)
        | ReadInputRegisters(_, _)
        | WriteSingleCoil(_, _)
        | WriteSingleRegister(_, _) => 4,
        WriteMultipleCoils(_, coils) => 5 + packed_coils_size(coils),
        WriteMultipleRegisters(_, words) => 5 + words.len() * 2,
        WriteMultipleRegistersWide(_, words) => 6 + words.len() * 2,
    };
    ADU_OVERHEAD + data_len
}

/// Length of the frame a slave sends back when it executes `request`
/// successfully, including address and CRC.
///
/// Exception responses are shorter and must be recognized by their
/// function code.
#[must_use]
pub fn expected_response_len(request: &Request<'_>) -> usize {
    use crate::frame::Request::*;
    match request {
        ReadCoils(_, quantity) | ReadDiscreteInputs(_, quantity) => {
            ADU_OVERHEAD + 1 + packed_coils_len(*quantity)
        }
        ReadHoldingRegisters(_, quantity) | ReadInputRegisters(_, quantity) => {
            ADU_OVERHEAD + 1 + usize::from(*quantity) * 2
        }
        WriteSingleCoil(_, _)
        | WriteSingleRegister(_, _)
        | WriteMultipleCoils(_, _)
        | WriteMultipleRegisters(_, _)
        | WriteMultipleRegistersWide(_, _) => WRITE_RESPONSE_LEN,
    }
}

fn bool_to_coil(state: bool) -> u16 {
    if state {
        0xFF00
    } else {
        0x0000
    }
}

fn packed_coils_len(quantity: Quantity) -> usize {
    (usize::from(quantity) + 7) / 8
}

fn packed_coils_size(coils: &[Coil]) -> usize {
    (coils.len() + 7) / 8
}

fn encode_packed_coils(buf: &mut BytesMut, coils: &[Coil]) -> usize {
    let packed_coils_size = packed_coils_size(coils);
    let offset = buf.len();
    buf.resize(offset + packed_coils_size, 0);
    let buf = &mut buf[offset..];
    for (i, b) in coils.iter().enumerate() {
        let v = u8::from(*b); // 0 or 1
        buf[i / 8] |= v << (i % 8);
    }
    packed_coils_size
}

/// Packs coils into bytes, LSB first.
///
/// Coil `i` ends up in bit `i % 8` of byte `i / 8`.
#[must_use]
pub fn pack_coils(coils: &[Coil]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(packed_coils_size(coils));
    encode_packed_coils(&mut buf, coils);
    buf.to_vec()
}

/// Unpacks the first `count` coils from the payload of a
/// `ReadCoils` or `ReadDiscreteInputs` response.
///
/// Missing bytes are treated as `OFF`.
#[must_use]
pub fn unpack_coils(bytes: &[u8], count: Quantity) -> Vec<Coil> {
    let mut res = Vec::with_capacity(count.into());
    for i in 0usize..count.into() {
        let byte = bytes.get(i / 8).copied().unwrap_or_default();
        res.push((byte >> (i % 8)) & 0b1 > 0);
    }
    res
}

/// Decodes the payload of a register read into words.
///
/// # Errors
///
/// Fails if `bytes` has an odd length.
pub fn decode_words(bytes: &[u8]) -> io::Result<Vec<Word>> {
    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "register payload has an odd number of bytes",
        ));
    }
    let rdr = &mut Cursor::new(bytes);
    let mut words = Vec::with_capacity(bytes.len() / 2);
    for _ in 0..bytes.len() / 2 {
        words.push(rdr.read_u16::<BigEndian>()?);
    }
    Ok(words)
}
