// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! RSA-OAEP encryption.
//!
//! A session salted with an RSA key carries its salt encrypted to that key
//! with OAEP, regardless of the key's own configured scheme.

use crate::crypto::hash;
use crate::Result;

/// An RSA public key.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PublicKey<'a> {
    /// The big-endian modulus.
    pub modulus: &'a [u8],
    /// The public exponent.
    pub exponent: u32,
}

/// An error returned by an encryption operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the implementation does not support the requested
    /// hash function, key size or label.
    Unsupported,

    /// Indicates that the key was malformed.
    BadKey,

    /// Indicates that the output buffer was too small for the ciphertext.
    BufferTooSmall,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// An RSA-OAEP encryption engine.
pub trait Encrypt {
    /// Encrypts `plaintext` to `key`, using `hash` for both the OAEP digest
    /// and MGF1, and `label` as the OAEP label.
    ///
    /// Returns the number of bytes of `out` written, which is always the
    /// size of the modulus.
    fn encrypt(
        &mut self,
        key: PublicKey,
        hash: hash::Algo,
        label: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error>;
}
impl dyn Encrypt {} // Ensure object-safe.
