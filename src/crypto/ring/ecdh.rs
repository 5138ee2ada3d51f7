// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::ecdh`] based on `ring`.
//!
//! Requires the `std` feature flag to be enabled.

use arrayvec::ArrayVec;
use ring::agreement;
use ring::rand::SystemRandom;

use crate::crypto::ecdh;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// The largest uncompressed point: `04 ‖ x ‖ y` on P-384.
const MAX_POINT_LEN: usize = 1 + 2 * 48;

/// A `ring`-based [`ecdh::Agreement`].
pub struct Agreement {
    rng: SystemRandom,
}

impl Agreement {
    /// Creates a new `Agreement`.
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for Agreement {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes `(x, y)` as an uncompressed SEC1 point, left-padding each
/// coordinate to the curve's size.
pub(crate) fn uncompressed_point(
    curve: ecdh::Curve,
    x: &[u8],
    y: &[u8],
) -> Result<ArrayVec<u8, MAX_POINT_LEN>, ecdh::Error> {
    let len = curve.coord_bytes();
    check!(x.len() <= len && y.len() <= len, ecdh::Error::InvalidPoint);

    let mut point = ArrayVec::new();
    point.push(0x04);
    for coord in [x, y] {
        point.extend(core::iter::repeat(0).take(len - coord.len()));
        point
            .try_extend_from_slice(coord)
            .map_err(|_| fail!(ecdh::Error::InvalidPoint))?;
    }
    Ok(point)
}

impl ecdh::Agreement for Agreement {
    fn supports(&mut self, _: ecdh::Curve) -> bool {
        true
    }

    fn ephemeral_agree(
        &mut self,
        curve: ecdh::Curve,
        peer_x: &[u8],
        peer_y: &[u8],
        our_x: &mut [u8],
        our_y: &mut [u8],
        z: &mut [u8],
    ) -> Result<(), ecdh::Error> {
        let len = curve.coord_bytes();
        check!(
            our_x.len() == len && our_y.len() == len && z.len() == len,
            ecdh::Error::WrongSize
        );

        let algo = match curve {
            ecdh::Curve::P256 => &agreement::ECDH_P256,
            ecdh::Curve::P384 => &agreement::ECDH_P384,
        };
        let peer = uncompressed_point(curve, peer_x, peer_y)?;
        let peer = agreement::UnparsedPublicKey::new(algo, peer);

        let private = agreement::EphemeralPrivateKey::generate(algo, &self.rng)
            .map_err(|_| fail!(ecdh::Error::Unspecified))?;
        let public = private
            .compute_public_key()
            .map_err(|_| fail!(ecdh::Error::Unspecified))?;
        let public = public.as_ref();
        our_x.copy_from_slice(&public[1..1 + len]);
        our_y.copy_from_slice(&public[1 + len..]);

        agreement::agree_ephemeral(private, &peer, (), |secret| {
            z.copy_from_slice(secret);
            Ok(())
        })
        .map_err(|_| fail!(ecdh::Error::InvalidPoint))
    }
}
