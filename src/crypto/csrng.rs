// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic random numbers.
//!
//! Sessions draw every caller nonce and every salt from a [`Csrng`]; a weak
//! generator silently weakens replay protection.

use crate::tpm::Digest;
use crate::Result;

/// An error returned by a CSRNG.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that more random bytes were requested than fit in a
    /// TPM digest.
    TooLong,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// A cryptographically-secure random number generator.
///
/// `Csrng`s must already be seeded with sufficient entropy; creating new
/// random number generators is beyond the scope of this trait.
pub trait Csrng {
    /// Fills `buf` with random bytes.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error>;
}
impl dyn Csrng {} // Ensure object-safe.

/// Helpers for drawing TPM values from a [`Csrng`].
#[extend::ext(name = CsrngExt)]
pub impl<C: Csrng + ?Sized> C {
    /// Returns a fresh random digest of `len` bytes, for use as a nonce or
    /// a salt.
    fn random_digest(&mut self, len: usize) -> Result<Digest, Error> {
        let mut digest =
            Digest::zeroed(len).ok_or_else(|| fail!(Error::TooLong))?;
        self.fill(digest.as_mut_slice())?;
        Ok(digest)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tpm::buf::MAX_DIGEST_SIZE;

    struct Counting(u8);
    impl Csrng for Counting {
        fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            for b in buf {
                self.0 = self.0.wrapping_add(1);
                *b = self.0;
            }
            Ok(())
        }
    }

    #[test]
    fn random_digest() {
        let mut rng = Counting(0);
        let rng: &mut dyn Csrng = &mut rng;
        assert_eq!(rng.random_digest(3).unwrap().as_slice(), &[1, 2, 3]);
        assert!(rng.random_digest(0).unwrap().is_empty());
        assert_eq!(
            rng.random_digest(MAX_DIGEST_SIZE + 1)
                .unwrap_err()
                .into_inner(),
            Error::TooLong
        );
    }
}
