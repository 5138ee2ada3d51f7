// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! TPM handles (`TPM_HANDLE`).

use core::fmt;

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::Result;

/// A handle as understood by the TPM itself.
///
/// The most significant byte of a handle selects its type (PCR, NV index,
/// session, permanent, transient or persistent object).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TpmHandle(pub u32);

impl TpmHandle {
    /// The owner hierarchy.
    pub const RH_OWNER: Self = Self(0x4000_0001);
    /// The null hierarchy.
    pub const RH_NULL: Self = Self(0x4000_0007);
    /// The handle used to mark a plaintext password authorization.
    pub const RS_PW: Self = Self(0x4000_0009);
    /// The lockout hierarchy.
    pub const RH_LOCKOUT: Self = Self(0x4000_000a);
    /// The endorsement hierarchy.
    pub const RH_ENDORSEMENT: Self = Self(0x4000_000b);
    /// The platform hierarchy.
    pub const RH_PLATFORM: Self = Self(0x4000_000c);
    /// The platform NV enable.
    pub const RH_PLATFORM_NV: Self = Self(0x4000_000d);

    /// The handle of the first PCR.
    pub const PCR_FIRST: Self = Self(0x0000_0000);
    /// The first NV index handle.
    pub const NV_INDEX_FIRST: Self = Self(0x0100_0000);
    /// The last NV index handle.
    pub const NV_INDEX_LAST: Self = Self(0x01ff_ffff);

    const TYPE_SHIFT: u32 = 24;
    const TYPE_HMAC_SESSION: u32 = 0x02;
    const TYPE_POLICY_SESSION: u32 = 0x03;

    /// Returns the handle-type byte.
    pub fn handle_type(self) -> u8 {
        (self.0 >> Self::TYPE_SHIFT) as u8
    }

    /// Returns whether this handle names an NV index.
    pub fn is_nv_index(self) -> bool {
        (Self::NV_INDEX_FIRST..=Self::NV_INDEX_LAST).contains(&self)
    }

    /// Returns whether this handle names an HMAC or policy session.
    pub fn is_session(self) -> bool {
        let ty = u32::from(self.handle_type());
        ty == Self::TYPE_HMAC_SESSION || ty == Self::TYPE_POLICY_SESSION
    }
}

impl fmt::Debug for TpmHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TpmHandle({:#010x})", self.0)
    }
}

impl FromWire for TpmHandle {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self(wire::read_int(r)?))
    }
}

impl ToWire for TpmHandle {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.0, &mut w)
    }
}
