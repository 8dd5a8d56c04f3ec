// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

use crate::{codec, Slave};

/// A request addressed to a single slave.
#[derive(Debug, Clone)]
pub struct RequestAdu<'a> {
    pub(crate) slave: Slave,
    pub(crate) pdu: Request<'a>,
}

impl<'a> RequestAdu<'a> {
    #[must_use]
    pub fn new(slave: Slave, request: Request<'a>) -> Self {
        Self {
            slave,
            pdu: request,
        }
    }

    #[must_use]
    pub fn slave(&self) -> Slave {
        self.slave
    }

    #[must_use]
    pub fn request(&self) -> &Request<'a> {
        &self.pdu
    }

    /// Captures everything needed to receive the matching response.
    pub(crate) fn context(&self, crc_order: CrcOrder) -> RequestContext {
        RequestContext {
            function_code: self.pdu.function_code(),
            slave: self.slave,
            crc_order,
            expected_len: codec::expected_response_len(&self.pdu),
        }
    }
}

/// State of the single outstanding exchange.
///
/// Recorded when a request has been written and consumed by
/// reading its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestContext {
    pub(crate) function_code: FunctionCode,
    pub(crate) slave: Slave,
    pub(crate) crc_order: CrcOrder,
    pub(crate) expected_len: usize,
}

impl RequestContext {
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    #[must_use]
    pub const fn slave(&self) -> Slave {
        self.slave
    }

    #[must_use]
    pub const fn crc_order(&self) -> CrcOrder {
        self.crc_order
    }

    /// Length of a successful response frame including the CRC.
    #[must_use]
    pub const fn expected_len(&self) -> usize {
        self.expected_len
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn context_of_read_request() {
        let adu = RequestAdu::new(Slave(0x11), Request::ReadInputRegisters(0x0008, 3));
        let ctx = adu.context(CrcOrder::BigEndian);
        assert_eq!(ctx.function_code(), FunctionCode::ReadInputRegisters);
        assert_eq!(ctx.slave(), Slave(0x11));
        assert_eq!(ctx.crc_order(), CrcOrder::BigEndian);
        assert_eq!(ctx.expected_len(), 11);
    }

    #[test]
    fn context_of_wide_write_request() {
        let adu = RequestAdu::new(
            Slave(1),
            Request::WriteMultipleRegistersWide(0, Cow::Owned(vec![1, 2, 3, 4])),
        );
        let ctx = adu.context(CrcOrder::LittleEndian);
        assert_eq!(ctx.function_code(), FunctionCode::WriteMultipleRegisters);
        assert_eq!(ctx.expected_len(), 8);
    }
}
