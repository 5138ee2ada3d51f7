// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Software implementations of the crypto traits.
//!
//! Hashing, randomness and key agreement are based on the [`ring`] crate;
//! AES-CFB and RSA-OAEP, which `ring` does not offer, use the RustCrypto
//! `aes`, `cfb-mode` and `rsa` crates. Everything that needs OS randomness
//! depends on the `std` feature flag.
//!
//! Types in this module, much like those in [`crypto`], should not be imported
//! directly. Instead, names such as `ring::hash::Engine` should be used
//! instead.
//!
//! The [`ring` warranty disclaimer] applies to this module as well.
//!
//! [`ring` warranty disclaimer]: https://github.com/briansmith/ring/blob/main/README.md

pub mod cipher;
#[cfg(feature = "std")]
pub mod csrng;
#[cfg(feature = "std")]
pub mod ecdh;
pub mod hash;
#[cfg(feature = "std")]
pub mod oaep;

#[cfg(any(doc, feature = "std"))]
use crate::crypto;

/// A [`crypto::Suite`] made of this module's implementations.
#[cfg(feature = "std")]
#[derive(Default)]
pub struct Suite {
    hash: hash::Engine,
    csrng: csrng::Csrng,
    cipher: cipher::Cipher,
    oaep: oaep::Encrypt,
    ecdh: ecdh::Agreement,
}

#[cfg(feature = "std")]
impl Suite {
    /// Creates a new `Suite`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "std")]
impl crypto::Suite for Suite {
    fn hash(&mut self) -> &mut dyn crypto::hash::Engine {
        &mut self.hash
    }

    fn csrng(&mut self) -> &mut dyn crypto::csrng::Csrng {
        &mut self.csrng
    }

    fn cipher(&mut self) -> &mut dyn crypto::cipher::Cipher {
        &mut self.cipher
    }

    fn oaep(&mut self) -> &mut dyn crypto::oaep::Encrypt {
        &mut self.oaep
    }

    fn ecdh(&mut self) -> &mut dyn crypto::ecdh::Agreement {
        &mut self.ecdh
    }
}
