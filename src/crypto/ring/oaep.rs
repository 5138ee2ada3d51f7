// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::oaep`] based on the RustCrypto `rsa` crate.
//!
//! Requires the `std` feature flag to be enabled.

use rand_core::OsRng;
use rsa::BigUint;
use rsa::Oaep;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::crypto::hash;
use crate::crypto::oaep;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// A software [`oaep::Encrypt`], drawing OAEP seeds from the OS.
#[derive(Default)]
pub struct Encrypt {
    _priv: (),
}

impl Encrypt {
    /// Creates a new `Encrypt`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl oaep::Encrypt for Encrypt {
    fn encrypt(
        &mut self,
        key: oaep::PublicKey,
        hash: hash::Algo,
        label: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, oaep::Error> {
        let label = core::str::from_utf8(label)
            .map_err(|_| fail!(oaep::Error::Unsupported))?;
        let public = RsaPublicKey::new(
            BigUint::from_bytes_be(key.modulus),
            BigUint::from(key.exponent),
        )
        .map_err(|_| fail!(oaep::Error::BadKey))?;

        let padding = match hash {
            hash::Algo::Sha1 => Oaep::new_with_label::<Sha1, _>(label),
            hash::Algo::Sha256 => Oaep::new_with_label::<Sha256, _>(label),
            hash::Algo::Sha384 => Oaep::new_with_label::<Sha384, _>(label),
            hash::Algo::Sha512 => Oaep::new_with_label::<Sha512, _>(label),
        };
        let ciphertext = public
            .encrypt(&mut OsRng, padding, plaintext)
            .map_err(|_| fail!(oaep::Error::Unspecified))?;

        let out = out
            .get_mut(..ciphertext.len())
            .ok_or_else(|| fail!(oaep::Error::BufferTooSmall))?;
        out.copy_from_slice(&ciphertext);
        Ok(ciphertext.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::oaep::Encrypt as _;
    use rsa::RsaPrivateKey;
    use testutil::data::keys;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn encrypt_then_decrypt() {
        let mut e = Encrypt::new();
        let key = oaep::PublicKey {
            modulus: keys::RSA2048_MODULUS,
            exponent: 65537,
        };
        let mut out = [0; 512];
        let len = e
            .encrypt(key, hash::Algo::Sha256, b"SECRET\0", b"salt", &mut out)
            .unwrap();
        assert_eq!(len, 256);

        let private = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(keys::RSA2048_MODULUS),
            BigUint::from(65537u32),
            BigUint::from_bytes_be(keys::RSA2048_PRIVATE_EXPONENT),
            vec![
                BigUint::from_bytes_be(keys::RSA2048_PRIME1),
                BigUint::from_bytes_be(keys::RSA2048_PRIME2),
            ],
        )
        .unwrap();
        let plain = private
            .decrypt(
                Oaep::new_with_label::<Sha256, _>("SECRET\0"),
                &out[..len],
            )
            .unwrap();
        assert_eq!(plain, b"salt");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn short_output() {
        let mut e = Encrypt::new();
        let key = oaep::PublicKey {
            modulus: keys::RSA2048_MODULUS,
            exponent: 65537,
        };
        let mut out = [0; 128];
        let err = e
            .encrypt(key, hash::Algo::Sha1, b"SECRET\0", b"salt", &mut out)
            .unwrap_err();
        assert_eq!(err.into_inner(), oaep::Error::BufferTooSmall);
    }
}
