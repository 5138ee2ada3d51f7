// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Symmetric block ciphers, used for parameter encryption.
//!
//! TPM parameter encryption runs a block cipher in CFB mode over the first
//! parameter of a command or response. CFB turns the cipher into a stream
//! cipher, so no padding is involved and the ciphertext is exactly as long
//! as the plaintext.

use crate::Result;

/// A block cipher algorithm.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Algo {
    /// AES, with a 128, 192 or 256-bit key.
    Aes,
}

impl Algo {
    /// The block size of this cipher, in bytes; also the size of its
    /// initialization vector.
    pub const fn block_bytes(self) -> usize {
        match self {
            Self::Aes => 16,
        }
    }

    /// Returns whether `bits` is a valid key size for this cipher.
    pub fn is_key_size(self, bits: usize) -> bool {
        match self {
            Self::Aes => matches!(bits, 128 | 192 | 256),
        }
    }
}

/// Whether to encrypt or decrypt.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    /// Plaintext to ciphertext.
    Encrypt,
    /// Ciphertext to plaintext.
    Decrypt,
}

/// An error returned by a cipher operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the key or initialization vector had the wrong size
    /// for the requested algorithm.
    WrongKeySize,

    /// Indicates that the implementation does not support the requested
    /// algorithm.
    Unsupported,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// A block cipher engine.
pub trait Cipher {
    /// Returns whether this engine supports the given algorithm.
    fn supports(&mut self, algo: Algo) -> bool;

    /// Encrypts or decrypts `buf` in place, in CFB mode with a full-block
    /// feedback segment.
    fn cfb(
        &mut self,
        algo: Algo,
        key: &[u8],
        iv: &[u8],
        dir: Direction,
        buf: &mut [u8],
    ) -> Result<(), Error>;
}
impl dyn Cipher {} // Ensure object-safe.
