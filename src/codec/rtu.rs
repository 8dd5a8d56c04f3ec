// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt as _};
use bytes::{BufMut as _, Bytes, BytesMut};

use crate::{
    error::{Error, ProtocolError},
    frame::{rtu::RequestAdu, CrcOrder, ExceptionCode, ExceptionResponse, FunctionCode},
    Result,
};

use super::{crc::crc16, encode_request_pdu};

/// Length of the shortest valid response, i.e. an exception:
/// address, function code, exception code and CRC.
pub(crate) const MIN_RESPONSE_LEN: usize = 1 + 1 + 1 + 2;

const CRC_LEN: usize = 2;

/// Serializes a request into a complete RTU frame.
///
/// # Errors
///
/// Fails with [`Error::QuantityOutOfRange`] if a multiple write carries
/// more than [`MAX_WRITE_COILS`](super::MAX_WRITE_COILS) coils or
/// [`MAX_WRITE_REGISTERS`](super::MAX_WRITE_REGISTERS) registers.
pub fn encode_request_adu(adu: &RequestAdu<'_>, crc_order: CrcOrder) -> Result<Bytes> {
    super::check_quantity(adu.request())?;
    let mut buf = BytesMut::with_capacity(super::expected_request_len(adu.request()));
    buf.put_u8(adu.slave().into());
    encode_request_pdu(&mut buf, adu.request());
    let crc = crc16(&buf);
    put_crc(&mut buf, crc, crc_order);
    Ok(buf.freeze())
}

fn put_crc(buf: &mut BytesMut, crc: u16, crc_order: CrcOrder) {
    match crc_order {
        CrcOrder::BigEndian => buf.put_u16(crc),
        CrcOrder::LittleEndian => buf.put_u16_le(crc),
    }
}

fn read_crc(bytes: &[u8], crc_order: CrcOrder) -> std::io::Result<u16> {
    let rdr = &mut Cursor::new(bytes);
    match crc_order {
        CrcOrder::BigEndian => rdr.read_u16::<BigEndian>(),
        CrcOrder::LittleEndian => rdr.read_u16::<LittleEndian>(),
    }
}

/// Whether the function code byte of `buf` marks an exception
/// response to `function`.
pub(crate) fn is_exception(buf: &[u8], function: FunctionCode) -> bool {
    buf.get(1) == Some(&function.exception_value())
}

/// Checks the trailing CRC of a received frame and strips it.
///
/// # Errors
///
/// Fails with [`Error::Checksum`] if the received CRC differs from
/// the one calculated over the preceding bytes.
pub fn verify_crc(frame: &[u8], crc_order: CrcOrder) -> Result<&[u8]> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(ProtocolError::FrameTooShort { len: frame.len() }.into());
    }
    let (adu, crc) = frame.split_at(frame.len() - CRC_LEN);
    let received = read_crc(crc, crc_order)?;
    let calculated = crc16(adu);
    if received != calculated {
        log::warn!(
            "CRC is not correct: received 0x{received:04X}, calculated 0x{calculated:04X}"
        );
        return Err(Error::Checksum {
            received,
            calculated,
        });
    }
    Ok(adu)
}

/// Decodes a CRC-checked response frame (without its CRC) that
/// answers a request with the given `function` code.
///
/// For reads the payload is copied into `dst` and the number of
/// copied bytes is returned. Writes return `0`, the echoed address
/// and value carry nothing new for the caller.
///
/// # Errors
///
/// Fails with [`Error::Exception`] or [`Error::UnknownException`] if
/// the slave rejected the request and with [`Error::Protocol`] if the
/// frame doesn't answer `function` at all.
pub fn parse_response(dst: &mut [u8], frame: &[u8], function: FunctionCode) -> Result<usize> {
    if frame.len() < MIN_RESPONSE_LEN - CRC_LEN {
        return Err(ProtocolError::FrameTooShort { len: frame.len() }.into());
    }
    let response = frame[1];
    if response == function.value() {
        if !function.is_read() {
            return Ok(0);
        }
        let byte_count = frame[2];
        let available = frame.len() - 3;
        let Some(payload) = frame.get(3..3 + usize::from(byte_count)) else {
            return Err(ProtocolError::ByteCountMismatch {
                byte_count,
                available,
            }
            .into());
        };
        let len = payload.len().min(dst.len());
        if len < payload.len() {
            log::warn!(
                "Output buffer too small: {} of {} payload bytes returned",
                len,
                payload.len()
            );
        }
        dst[..len].copy_from_slice(&payload[..len]);
        return Ok(len);
    }
    if response == function.exception_value() {
        let code = frame[2];
        return Err(match ExceptionCode::try_from(code) {
            Ok(exception) => ExceptionResponse {
                function,
                exception,
            }
            .into(),
            Err(code) => Error::UnknownException { function, code },
        });
    }
    log::warn!("Unexpected function code 0x{response:02X} in response to function {function}");
    Err(ProtocolError::FunctionCodeMismatch {
        request: function,
        response,
    }
    .into())
}
