// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Ephemeral elliptic-curve Diffie-Hellman.

use crate::Result;

/// An elliptic curve.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Curve {
    /// NIST P-256.
    P256,
    /// NIST P-384.
    P384,
}

impl Curve {
    /// The size of a coordinate on this curve, in bytes.
    ///
    /// This is also the size of the shared secret.
    pub const fn coord_bytes(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }
}

/// An error returned by a key agreement.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the implementation does not support the curve.
    Unsupported,

    /// Indicates that the peer's point was not on the curve.
    InvalidPoint,

    /// Indicates that an output buffer had the wrong size.
    WrongSize,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// An ECDH engine.
pub trait Agreement {
    /// Returns whether this engine supports the given curve.
    fn supports(&mut self, curve: Curve) -> bool;

    /// Generates an ephemeral key pair and agrees on a secret with the peer
    /// at `(peer_x, peer_y)`.
    ///
    /// Peer coordinates may be shorter than [`Curve::coord_bytes()`], in
    /// which case they are treated as having leading zeroes. The ephemeral
    /// public point is written to `our_x` and `our_y`, and the x coordinate
    /// of the shared point to `z`; all three must be exactly
    /// [`Curve::coord_bytes()`] long.
    fn ephemeral_agree(
        &mut self,
        curve: Curve,
        peer_x: &[u8],
        peer_y: &[u8],
        our_x: &mut [u8],
        our_y: &mut [u8],
        z: &mut [u8],
    ) -> Result<(), Error>;
}
impl dyn Agreement {} // Ensure object-safe.
