// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable cryptograpy traits.
//!
//! The session engine needs a handful of cryptographic primitives: hashes and
//! HMACs, random bytes, a block cipher in CFB mode, RSA-OAEP encryption and
//! ephemeral ECDH. This module provides object-safe traits that abstract over
//! those operations, so that the engine decides *when* and *with what* to
//! call them, but not *how* they are computed.
//!
//! Users are expected to provide their own implementations of these traits,
//! which may suit particular hardware or certification needs. A [`Suite`]
//! bundles one implementation of each for an execution context.
//!
//! It is recommended to not import the traits in this module directly, since
//! a lot of them have the same name. Instead, use imports like
//! `use warden::crypto::hash;` and partially-qualified names like
//! `hash::Engine`.
//!
//! The TPM key derivation functions are not a pluggable primitive: they are
//! built on top of [`hash::Engine`] in [`kdf`].
//!
//! Software implementations of these traits are provided under the
//! [`ring` module], based on the [`ring`] crate and the RustCrypto crates.
//! Their presence is controlled by the `ring` feature flag; some operations
//! require `std` as well.
//!
//! [`ring` module]: ring/index.html

pub mod cipher;
pub mod csrng;
pub mod ecdh;
pub mod hash;
pub mod kdf;
pub mod oaep;

#[cfg(feature = "ring")]
pub mod ring;

/// A complete set of the primitives an execution context needs.
///
/// Every accessor hands out a mutable borrow of one primitive at a time;
/// callers that need two primitives use them one after the other.
pub trait Suite {
    /// Returns the hashing and HMAC engine.
    fn hash(&mut self) -> &mut dyn hash::Engine;

    /// Returns the random number generator used for nonces and salts.
    fn csrng(&mut self) -> &mut dyn csrng::Csrng;

    /// Returns the block cipher used for parameter encryption.
    fn cipher(&mut self) -> &mut dyn cipher::Cipher;

    /// Returns the RSA-OAEP engine used for salting sessions.
    fn oaep(&mut self) -> &mut dyn oaep::Encrypt;

    /// Returns the ECDH engine used for salting sessions.
    fn ecdh(&mut self) -> &mut dyn ecdh::Agreement;
}
impl dyn Suite {} // Ensure object-safe.
