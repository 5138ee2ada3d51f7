// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Provides the [`Write`] trait, analogous to [`std::io::Write`].

use core::mem;

use static_assertions::assert_obj_safe;

use crate::io;
use crate::io::endian::BeInt;
use crate::Result;

/// Represents a place that bytes can be written to, such as a `&[u8]`.
pub trait Write {
    /// Attempt to write `buf` exactly to `self`.
    ///
    /// This function does not perform partial writes: it will either block
    /// until completion or return an error.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), io::Error>;

    /// Writes a big-endian integer.
    ///
    /// # Note
    /// Do not implement this function yourself. Callers are not required to
    /// call it in order to actually perform a write, so whether or not it is
    /// called is an implementation detail.
    #[inline]
    fn write_be<I: BeInt>(&mut self, val: I) -> Result<(), io::Error>
    where
        Self: Sized,
    {
        val.write_to(self)
    }
}

assert_obj_safe!(Write);

impl<W: Write + ?Sized> Write for &'_ mut W {
    #[inline]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), io::Error> {
        W::write_bytes(*self, buf)
    }
}

impl Write for &'_ mut [u8] {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), io::Error> {
        let n = buf.len();
        if self.len() < n {
            return Err(fail!(io::Error::BufferExhausted));
        }

        let (dest, rest) = mem::take(self).split_at_mut(n);
        dest.copy_from_slice(buf);
        *self = rest;
        Ok(())
    }
}

impl<const N: usize> Write for arrayvec::ArrayVec<u8, N> {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), io::Error> {
        self.try_extend_from_slice(buf)
            .map_err(|_| fail!(io::Error::BufferExhausted))
    }
}

/// A [`Write`] that discards everything written to it, keeping only a count
/// of the bytes.
///
/// Used to compute the size prefix of a structure before marshaling it.
#[derive(Copy, Clone, Debug, Default)]
pub struct Counter {
    count: usize,
}

impl Counter {
    /// Creates a new `Counter` with a count of zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bytes written so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Write for Counter {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), io::Error> {
        self.count = self
            .count
            .checked_add(buf.len())
            .ok_or_else(|| fail!(io::Error::BufferExhausted))?;
        Ok(())
    }
}
