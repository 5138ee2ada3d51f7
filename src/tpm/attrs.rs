// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Session attributes (`TPMA_SESSION`).

use enumflags2::bitflags;
use enumflags2::BitFlags;

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::Result;

/// A single session attribute bit.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionAttr {
    /// The session stays active after the command completes.
    ContinueSession = 0x01,
    /// The command is audited exclusively.
    AuditExclusive = 0x02,
    /// The audit digest is reset.
    AuditReset = 0x04,
    /// The first command parameter is encrypted by the caller.
    Decrypt = 0x20,
    /// The first response parameter is encrypted by the TPM.
    Encrypt = 0x40,
    /// The session is used for audit.
    Audit = 0x80,
}

/// A set of [`SessionAttr`]s.
pub type SessionAttrs = BitFlags<SessionAttr>;

impl FromWire for SessionAttrs {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        // Reserved bits are dropped; no TPM sets them.
        Ok(BitFlags::from_bits_truncate(wire::read_int::<u8, _>(r)?))
    }
}

impl ToWire for SessionAttrs {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.bits(), &mut w)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attrs_wire() {
        let attrs = SessionAttr::ContinueSession | SessionAttr::Encrypt;
        let mut buf = [0; 1];
        attrs.to_wire(&mut buf[..]).unwrap();
        assert_eq!(buf, [0x41]);

        let parsed = SessionAttrs::from_wire(&mut &[0x39][..]).unwrap();
        assert_eq!(parsed, SessionAttr::ContinueSession | SessionAttr::Decrypt);
    }
}
