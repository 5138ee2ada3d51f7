// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::cipher`] based on the RustCrypto `aes` and
//! `cfb-mode` crates.
//!
//! `ring` does not expose raw block ciphers, so this is the one primitive
//! in this module that does not actually use it.

use aes::Aes128;
use aes::Aes192;
use aes::Aes256;
use cfb_mode::Decryptor;
use cfb_mode::Encryptor;
use ::cipher::AsyncStreamCipher as _;
use ::cipher::KeyIvInit as _;

use crate::crypto::cipher;
use crate::crypto::cipher::Direction;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// A software [`cipher::Cipher`].
#[derive(Default)]
pub struct Cipher {
    _priv: (),
}

impl Cipher {
    /// Creates a new `Cipher`.
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! cfb {
    ($aes:ty, $key:expr, $iv:expr, $dir:expr, $buf:expr) => {
        match $dir {
            Direction::Encrypt => Encryptor::<$aes>::new_from_slices($key, $iv)
                .map(|c| c.encrypt($buf)),
            Direction::Decrypt => Decryptor::<$aes>::new_from_slices($key, $iv)
                .map(|c| c.decrypt($buf)),
        }
    };
}

impl cipher::Cipher for Cipher {
    fn supports(&mut self, algo: cipher::Algo) -> bool {
        matches!(algo, cipher::Algo::Aes)
    }

    fn cfb(
        &mut self,
        algo: cipher::Algo,
        key: &[u8],
        iv: &[u8],
        dir: Direction,
        buf: &mut [u8],
    ) -> Result<(), cipher::Error> {
        let cipher::Algo::Aes = algo;
        check!(
            iv.len() == algo.block_bytes(),
            cipher::Error::WrongKeySize
        );

        let result = match key.len() {
            16 => cfb!(Aes128, key, iv, dir, buf),
            24 => cfb!(Aes192, key, iv, dir, buf),
            32 => cfb!(Aes256, key, iv, dir, buf),
            len => {
                return Err(fail!(
                    cipher::Error::WrongKeySize,
                    "bad AES key length: {}",
                    len
                ))
            }
        };
        result.map_err(|_| fail!(cipher::Error::WrongKeySize))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::cipher::Cipher as _;
    use testutil::data::misc_crypto;

    #[test]
    fn aes128_cfb() {
        let mut c = Cipher::new();
        let mut buf = misc_crypto::AES128_CFB_PLAINTEXT.to_vec();
        c.cfb(
            cipher::Algo::Aes,
            misc_crypto::AES128_CFB_KEY,
            misc_crypto::AES128_CFB_IV,
            Direction::Encrypt,
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, misc_crypto::AES128_CFB_CIPHERTEXT);

        c.cfb(
            cipher::Algo::Aes,
            misc_crypto::AES128_CFB_KEY,
            misc_crypto::AES128_CFB_IV,
            Direction::Decrypt,
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, misc_crypto::AES128_CFB_PLAINTEXT);
    }

    #[test]
    fn bad_key() {
        let mut c = Cipher::new();
        let mut buf = [0; 4];
        let err = c
            .cfb(
                cipher::Algo::Aes,
                &[0; 15],
                &[0; 16],
                Direction::Encrypt,
                &mut buf,
            )
            .unwrap_err();
        assert_eq!(err.into_inner(), cipher::Error::WrongKeySize);
    }
}
