// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Digests and HMACs.
//!
//! Every hash a TPM session computes (names, parameter hashes, session
//! HMACs, and the KDF blocks) is a digest or HMAC over a concatenation of
//! byte strings, so [`EngineExt`] is built around hashing a list of parts.
//! It is kept separate from [`Engine`], which must stay object-safe.

use crate::Result;

/// A hash algorithm a session or a name may use.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Algo {
    /// SHA-1.
    ///
    /// Only present because TPM sessions may still be started with it.
    Sha1,
    /// 256-bit SHA-2.
    Sha256,
    /// 384-bit SHA-2.
    Sha384,
    /// 512-bit SHA-2.
    Sha512,
}

impl Algo {
    /// The number of bits in a digest or HMAC of this algorithm.
    #[inline]
    pub const fn bits(self) -> usize {
        match self {
            Self::Sha1 => 160,
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    /// The number of bytes in a digest or HMAC of this algorithm.
    ///
    /// This is also the size of the nonces a session using this algorithm
    /// exchanges.
    #[inline]
    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }
}

/// An error returned by a hashing function.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the output buffer, or the digest to compare against,
    /// does not have the algorithm's digest size.
    WrongSize,

    /// Indicates that a write or finish operation was requested without a
    /// digest in progress.
    Idle,

    /// Indicates that a computed digest did not match the expected one.
    Mismatch,

    /// Indicates that the engine does not implement the requested
    /// algorithm.
    Unsupported,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// A hashing engine, which maintains the state for one digest or HMAC at a
/// time.
///
/// Implementers only provide the "raw" API; callers go through [`Hasher`]
/// or the helpers in [`EngineExt`].
pub trait Engine {
    /// Returns whether this engine supports the given algorithm.
    fn supports(&mut self, algo: Algo) -> bool;

    /// Begins a new hashing operation, discarding any previous state.
    ///
    /// If `key` is `Some`, this becomes an HMAC operation instead, using that
    /// as the key. An empty key is valid, and is what an unsalted, unbound
    /// session with no auth value uses.
    fn start_raw(
        &mut self,
        algo: Algo,
        key: Option<&[u8]>,
    ) -> Result<(), Error>;

    /// Adds `data` to the hashing state.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Completes the operation, writing the result to `out`.
    ///
    /// The engine is idle afterwards.
    fn finish_raw(&mut self, out: &mut [u8]) -> Result<(), Error>;

    /// Completes the operation and compares the result to `expected`,
    /// returning [`Error::Mismatch`] if they differ.
    ///
    /// HMAC comparisons must run in constant time. The engine is idle
    /// afterwards.
    fn compare_raw(&mut self, expected: &[u8]) -> Result<(), Error>;
}

/// Helpers for driving an [`Engine`].
#[extend::ext(name = EngineExt)]
pub impl<E: Engine + ?Sized> E {
    /// Begins a new digest.
    #[inline]
    fn new_hash(&mut self, algo: Algo) -> Result<Hasher<&mut Self>, Error> {
        self.start_raw(algo, None)?;
        Ok(Hasher { engine: self })
    }

    /// Begins a new HMAC keyed with `key`.
    #[inline]
    fn new_hmac(
        &mut self,
        algo: Algo,
        key: &[u8],
    ) -> Result<Hasher<&mut Self>, Error> {
        self.start_raw(algo, Some(key))?;
        Ok(Hasher { engine: self })
    }

    /// Writes the digest of the concatenation of `parts` to `out`.
    fn hash_parts(
        &mut self,
        algo: Algo,
        parts: &[&[u8]],
        out: &mut [u8],
    ) -> Result<(), Error> {
        let mut h = self.new_hash(algo)?;
        h.write_parts(parts)?;
        h.finish(out)
    }

    /// Writes the HMAC of the concatenation of `parts` to `out`.
    fn hmac_parts(
        &mut self,
        algo: Algo,
        key: &[u8],
        parts: &[&[u8]],
        out: &mut [u8],
    ) -> Result<(), Error> {
        let mut h = self.new_hmac(algo, key)?;
        h.write_parts(parts)?;
        h.finish(out)
    }
}

// Ensure Engine is object-safe.
impl dyn Engine {}

/// A digest or HMAC in progress on an [`Engine`].
pub struct Hasher<E> {
    engine: E,
}

impl<E: Engine + ?Sized> Hasher<&mut E> {
    /// Adds `data` to the hashing state.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.engine.write_raw(data)
    }

    /// Adds each of `parts`, in order.
    pub fn write_parts(&mut self, parts: &[&[u8]]) -> Result<(), Error> {
        for part in parts {
            self.engine.write_raw(part)?;
        }
        Ok(())
    }

    /// Adds `n` in TPM byte order.
    pub fn write_u32(&mut self, n: u32) -> Result<(), Error> {
        self.engine.write_raw(&n.to_be_bytes())
    }

    /// Completes the operation, writing the result to `out`.
    pub fn finish(self, out: &mut [u8]) -> Result<(), Error> {
        self.engine.finish_raw(out)
    }

    /// Completes the operation, comparing the result to `expected`.
    pub fn expect(self, expected: &[u8]) -> Result<(), Error> {
        self.engine.compare_raw(expected)
    }
}
