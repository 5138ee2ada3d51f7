// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Command codes (`TPM_CC`) and response codes (`TPM_RC`).
//!
//! Both are open-ended sets, so they are modeled as integer newtypes with
//! named constants rather than as enums.

use core::fmt;

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::Result;

/// A TPM command code.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CommandCode(pub u32);

impl CommandCode {
    /// `TPM2_NV_Write`.
    pub const NV_WRITE: Self = Self(0x0000_0137);
    /// `TPM2_NV_Read`.
    pub const NV_READ: Self = Self(0x0000_014e);
    /// `TPM2_FlushContext`.
    pub const FLUSH_CONTEXT: Self = Self(0x0000_0165);
    /// `TPM2_NV_ReadPublic`.
    pub const NV_READ_PUBLIC: Self = Self(0x0000_0169);
    /// `TPM2_PolicyAuthValue`.
    pub const POLICY_AUTH_VALUE: Self = Self(0x0000_016b);
    /// `TPM2_ReadPublic`.
    pub const READ_PUBLIC: Self = Self(0x0000_0173);
    /// `TPM2_StartAuthSession`.
    pub const START_AUTH_SESSION: Self = Self(0x0000_0176);
    /// `TPM2_GetRandom`.
    pub const GET_RANDOM: Self = Self(0x0000_017b);
    /// `TPM2_PolicyPassword`.
    pub const POLICY_PASSWORD: Self = Self(0x0000_018c);
}

impl fmt::Debug for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CommandCode({:#x})", self.0)
    }
}

impl FromWire for CommandCode {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self(wire::read_int(r)?))
    }
}

impl ToWire for CommandCode {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.0, &mut w)
    }
}

/// A TPM response code.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ResponseCode(pub u32);

impl ResponseCode {
    /// The command completed successfully.
    pub const SUCCESS: Self = Self(0x0000_0000);
    /// The TPM was interrupted by a higher-priority task and the command
    /// was not started.
    pub const YIELDED: Self = Self(0x0000_0908);
    /// The TPM is running self tests.
    pub const TESTING: Self = Self(0x0000_090a);
    /// The TPM was busy and asks for the command to be sent again.
    pub const RETRY: Self = Self(0x0000_0922);

    /// Returns whether this code indicates success.
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Returns whether this is a transient condition after which the very
    /// same command should be submitted again.
    pub fn is_transient(self) -> bool {
        self == Self::RETRY || self == Self::TESTING || self == Self::YIELDED
    }
}

impl fmt::Debug for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResponseCode({:#x})", self.0)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TPM_RC {:#x}", self.0)
    }
}

impl FromWire for ResponseCode {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self(wire::read_int(r)?))
    }
}

impl ToWire for ResponseCode {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.0, &mut w)
    }
}
