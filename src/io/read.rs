// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Provides the [`Read`] trait, analogous to [`std::io::Read`].

use core::mem;

use static_assertions::assert_obj_safe;

use crate::io;
use crate::io::endian::BeInt;
use crate::Result;

/// Represents a place that bytes can be read from, such as a `&[u8]`.
///
/// # Relation with [`std::io::Read`]
/// [`std::io::Read`] is distinct from `Read`, since `Read` must know,
/// a-priori, the total length of the underlying buffer. TPM responses
/// always arrive as a single complete buffer, so this is never a
/// restriction in practice.
pub trait Read {
    /// Reads exactly `n` bytes from `self`.
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error>;

    /// Returns the number of bytes still available to read.
    fn remaining_data(&self) -> usize;

    /// Reads a big-endian integer.
    ///
    /// # Note
    /// Do not implement this function yourself. Callers are not required to
    /// call it in order to actually perform a read, so whether or not it is
    /// called is an implementation detail.
    #[inline]
    fn read_be<I: BeInt>(&mut self) -> Result<I, io::Error>
    where
        Self: Sized,
    {
        I::read_from(self)
    }
}

assert_obj_safe!(Read);

impl<R: Read + ?Sized> Read for &'_ mut R {
    #[inline]
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        R::read_bytes(*self, out)
    }

    #[inline]
    fn remaining_data(&self) -> usize {
        R::remaining_data(*self)
    }
}

impl Read for &[u8] {
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        let n = out.len();
        if self.len() < n {
            return Err(fail!(io::Error::BufferExhausted));
        }

        out.copy_from_slice(&self[..n]);
        *self = &self[n..];

        Ok(())
    }

    fn remaining_data(&self) -> usize {
        self.len()
    }
}

impl Read for &mut [u8] {
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        let n = out.len();
        if self.len() < n {
            return Err(fail!(io::Error::BufferExhausted));
        }

        out.copy_from_slice(&self[..n]);
        let buf = mem::take(self);
        *self = &mut buf[n..];

        Ok(())
    }

    fn remaining_data(&self) -> usize {
        self.len()
    }
}

/// A [`Read`] that yields no more than a fixed number of bytes from another
/// reader.
///
/// This is how the body of a `TPM2B` structure is read: whatever parses the
/// body sees only the bytes its size prefix declares.
pub struct Limit<R> {
    inner: R,
    left: usize,
}

impl<R: Read> Limit<R> {
    /// Limits `inner` to its next `len` bytes.
    ///
    /// Fails if `inner` has fewer than `len` bytes left.
    pub fn new(inner: R, len: usize) -> Result<Self, io::Error> {
        check!(len <= inner.remaining_data(), io::Error::BufferExhausted);
        Ok(Self { inner, left: len })
    }
}

impl<R: Read> Read for Limit<R> {
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        check!(out.len() <= self.left, io::Error::BufferExhausted);
        self.inner.read_bytes(out)?;
        self.left -= out.len();
        Ok(())
    }

    fn remaining_data(&self) -> usize {
        self.left
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_bytes() {
        let mut bytes: &[u8] = b"Hello!";

        let mut three_bytes = [0; 3];
        bytes.read_bytes(&mut three_bytes).unwrap();
        assert_eq!(&three_bytes[..], b"Hel");
        assert_eq!(bytes.len(), 3);

        assert_eq!(bytes.read_be::<u16>().unwrap(), 0x6c6f);
        assert_eq!(bytes.remaining_data(), 1);
        assert!(bytes.read_be::<u32>().is_err());
    }

    #[test]
    fn limit() {
        let mut bytes: &[u8] = &[0x00, 0x02, 0xaa, 0xbb, 0xcc];
        let len = bytes.read_be::<u16>().unwrap();

        let mut body = Limit::new(&mut bytes, len as usize).unwrap();
        assert_eq!(body.remaining_data(), 2);
        assert!(body.read_be::<u32>().is_err());
        assert_eq!(body.read_be::<u16>().unwrap(), 0xaabb);
        assert_eq!(body.remaining_data(), 0);
        assert!(body.read_be::<u8>().is_err());

        assert_eq!(bytes, &[0xcc]);
        assert!(Limit::new(&mut bytes, 2).is_err());
    }
}
