// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Sized (`TPM2B`) buffers.

use core::fmt;

use arrayvec::ArrayVec;

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::Result;

/// A `TPM2B` buffer: up to `N` bytes, marshaled with a 16-bit length prefix.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Tpm2b<const N: usize> {
    bytes: ArrayVec<u8, N>,
}

/// The largest digest any supported hash produces.
pub const MAX_DIGEST_SIZE: usize = 64;

/// The size of a `TPMU_NAME`: a digest prefixed with its algorithm.
pub const NAME_SIZE: usize = MAX_DIGEST_SIZE + 2;

/// A digest (`TPM2B_DIGEST`).
pub type Digest = Tpm2b<MAX_DIGEST_SIZE>;

/// A session nonce (`TPM2B_NONCE`).
pub type Nonce = Digest;

/// An authorization value or HMAC (`TPM2B_AUTH`).
pub type Auth = Digest;

/// An entity name (`TPM2B_NAME`).
pub type Name = Tpm2b<NAME_SIZE>;

/// An encrypted salt or seed (`TPM2B_ENCRYPTED_SECRET`).
pub type EncryptedSecret = Tpm2b<512>;

/// An RSA modulus (`TPM2B_PUBLIC_KEY_RSA`).
pub type PublicKeyRsa = Tpm2b<512>;

/// An elliptic curve coordinate (`TPM2B_ECC_PARAMETER`).
pub type EccParameter = Tpm2b<128>;

/// The contents of an NV index (`TPM2B_MAX_NV_BUFFER`).
pub type MaxNvBuffer = Tpm2b<2048>;

impl<const N: usize> Tpm2b<N> {
    /// The largest number of bytes this buffer can hold.
    pub const CAPACITY: usize = N;

    /// Creates a new, empty buffer.
    pub fn new() -> Self {
        Self {
            bytes: ArrayVec::new(),
        }
    }

    /// Copies `bytes` into a new buffer, returning `None` if they do not fit.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut buf = Self::new();
        buf.bytes.try_extend_from_slice(bytes).ok()?;
        Some(buf)
    }

    /// Creates a buffer of `len` zeroes, returning `None` if `len` does not
    /// fit.
    pub fn zeroed(len: usize) -> Option<Self> {
        if len > N {
            return None;
        }
        let mut buf = Self::new();
        buf.bytes.extend(core::iter::repeat(0).take(len));
        Some(buf)
    }

    /// Returns the contents of this buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the contents of this buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Returns the number of bytes in this buffer.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns whether this buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Empties this buffer.
    pub fn clear(&mut self) {
        self.bytes.clear()
    }
}

impl<const N: usize> AsRef<[u8]> for Tpm2b<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<const N: usize> fmt::Debug for Tpm2b<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tpm2b[")?;
        for b in self.as_slice() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "]")
    }
}

impl<const N: usize> FromWire for Tpm2b<N> {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let len = wire::read_int::<u16, _>(r)? as usize;
        let mut buf = Self::zeroed(len).ok_or_else(|| {
            fail!(
                wire::Error::OutOfRange,
                "sized buffer of {} bytes exceeds capacity {}",
                len,
                N,
            )
        })?;
        r.read_bytes(buf.as_mut_slice())?;
        Ok(buf)
    }
}

impl<const N: usize> ToWire for Tpm2b<N> {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.len() as u16, &mut w)?;
        w.write_bytes(self.as_slice())?;
        Ok(())
    }
}
