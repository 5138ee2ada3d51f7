// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::hash`] based on `ring`.

use core::mem;

use ring::digest;
use ring::hmac;

use crate::crypto::hash;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

fn digest_algorithm(algo: hash::Algo) -> &'static digest::Algorithm {
    match algo {
        hash::Algo::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        hash::Algo::Sha256 => &digest::SHA256,
        hash::Algo::Sha384 => &digest::SHA384,
        hash::Algo::Sha512 => &digest::SHA512,
    }
}

fn hmac_algorithm(algo: hash::Algo) -> hmac::Algorithm {
    match algo {
        hash::Algo::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        hash::Algo::Sha256 => hmac::HMAC_SHA256,
        hash::Algo::Sha384 => hmac::HMAC_SHA384,
        hash::Algo::Sha512 => hmac::HMAC_SHA512,
    }
}

/// A `ring`-based [`hash::Engine`].
///
/// Supports every [`hash::Algo`], SHA-1 included.
pub struct Engine {
    inner: Inner,
}

enum Inner {
    Idle,
    Hash(digest::Context),
    Hmac(hmac::Context, usize),
}

impl Engine {
    /// Creates a new, idle `Engine`.
    pub fn new() -> Self {
        Self { inner: Inner::Idle }
    }

    /// Takes the operation in progress, leaving the engine idle, and returns
    /// its output.
    fn take(&mut self, len: usize) -> Result<Output, hash::Error> {
        let (out, out_len) = match mem::replace(&mut self.inner, Inner::Idle)
        {
            Inner::Idle => return Err(fail!(hash::Error::Idle)),
            Inner::Hash(c) => {
                let n = c.algorithm().output_len;
                (Output::Digest(c.finish()), n)
            }
            Inner::Hmac(c, n) => (Output::Tag(c.sign()), n),
        };
        check!(len == out_len, hash::Error::WrongSize);
        Ok(out)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

enum Output {
    Digest(digest::Digest),
    Tag(hmac::Tag),
}

impl AsRef<[u8]> for Output {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Digest(d) => d.as_ref(),
            Self::Tag(t) => t.as_ref(),
        }
    }
}

impl hash::Engine for Engine {
    fn supports(&mut self, _: hash::Algo) -> bool {
        true
    }

    fn start_raw(
        &mut self,
        algo: hash::Algo,
        key: Option<&[u8]>,
    ) -> Result<(), hash::Error> {
        self.inner = match key {
            Some(k) => {
                let key = hmac::Key::new(hmac_algorithm(algo), k);
                Inner::Hmac(hmac::Context::with_key(&key), algo.bytes())
            }
            None => Inner::Hash(digest::Context::new(digest_algorithm(algo))),
        };
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), hash::Error> {
        match &mut self.inner {
            Inner::Idle => return Err(fail!(hash::Error::Idle)),
            Inner::Hash(c) => c.update(data),
            Inner::Hmac(c, _) => c.update(data),
        }
        Ok(())
    }

    fn finish_raw(&mut self, out: &mut [u8]) -> Result<(), hash::Error> {
        let result = self.take(out.len())?;
        out.copy_from_slice(result.as_ref());
        Ok(())
    }

    fn compare_raw(&mut self, expected: &[u8]) -> Result<(), hash::Error> {
        let result = self.take(expected.len())?;
        ring::constant_time::verify_slices_are_equal(result.as_ref(), expected)
            .map_err(|_| fail!(hash::Error::Mismatch))?;
        Ok(())
    }
}
