// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Wire format traits.
//!
//! This module provides [`FromWire`] and [`ToWire`], a pair of traits similar
//! to the core traits in the `serde` library. Rather than representing a
//! generically serializeable type, they represent types that can be converted
//! to and from the TPM 2.0 marshaling format: big-endian integers, and
//! `TPM2B` buffers prefixed with a 16-bit length.

use core::fmt;

use crate::io;
use crate::io::endian::BeInt;
use crate::io::Read;
use crate::io::Write;
use crate::Result;

/// A type which can be deserialized from the TPM wire format.
pub trait FromWire: Sized {
    /// Deserializes a `Self` out of `r`.
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, Error>;
}

/// A type which can be serialized into the TPM wire format.
pub trait ToWire {
    /// Serializes `self` into `w`.
    fn to_wire<W: Write>(&self, w: W) -> Result<(), Error>;
}

/// A marshalling error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates that something went wrong in an `io` operation.
    Io(io::Error),

    /// Indicates that some field was outside of its valid range, such as an
    /// unknown algorithm or a sized buffer larger than its maximum.
    OutOfRange,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

debug_from!(Error => io::Error);

/// Reads a big-endian integer out of `r`.
#[inline]
pub(crate) fn read_int<I: BeInt, R: Read>(r: &mut R) -> Result<I, Error> {
    Ok(r.read_be()?)
}

/// Writes a big-endian integer into `w`.
#[inline]
pub(crate) fn write_int<I: BeInt, W: Write>(
    val: I,
    w: &mut W,
) -> Result<(), Error> {
    Ok(w.write_be(val)?)
}

/// Scratch space for marshaling a single public area, large enough for any
/// key this crate can describe.
pub const SIZED_SCRATCH: usize = 1024;

/// Returns the number of bytes `val` occupies on the wire.
pub fn wire_len<T: ToWire + ?Sized>(val: &T) -> Result<usize, Error> {
    let mut counter = io::Counter::new();
    val.to_wire(&mut counter)?;
    Ok(counter.count())
}

/// Writes `val` as a sized structure: a 16-bit byte count followed by the
/// marshaled value, as in `TPM2B_PUBLIC`.
pub fn write_sized<T: ToWire, W: Write>(
    val: &T,
    mut w: W,
) -> Result<(), Error> {
    let size = wire_len(val)?;
    check!(size <= u16::MAX as usize, Error::OutOfRange);
    w.write_be(size as u16)?;
    val.to_wire(&mut w)
}

/// Reads a sized structure written by [`write_sized()`].
///
/// The declared byte count must match the number of bytes the inner value
/// actually occupies.
pub fn read_sized<T: FromWire, R: Read>(r: &mut R) -> Result<T, Error> {
    let size = r.read_be::<u16>()?;
    let mut body = io::Limit::new(&mut *r, size as usize)?;
    let val = T::from_wire(&mut body)?;
    check!(body.remaining_data() == 0, Error::OutOfRange);
    Ok(val)
}

/// Represents a C-like enum that can be converted to and from a wire
/// representation as well as to and from a string representation.
///
/// An implementation of this trait can be thought of as an unsigned
/// integer with a limited range: every enum variant can be converted
/// to the wire format and back, though not every value of the wire
/// representation can be converted into an enum variant.
///
/// In particular the following identity must hold for all types T:
/// ```
/// # use warden::tpm::wire::WireEnum;
/// # fn test<T: WireEnum + Copy + PartialEq + std::fmt::Debug>(x: T) {
/// assert_eq!(T::from_wire_value(T::to_wire_value(x)), Some(x));
/// # }
/// ```
///
/// Also, the following identity must hold for all types T:
/// ```
/// # use warden::tpm::wire::WireEnum;
/// # fn test<T: WireEnum + Copy + PartialEq + std::fmt::Debug>(x: T) {
/// assert_eq!(T::from_name(T::name(x)), Some(x));
/// # }
/// ```
pub trait WireEnum: Sized + Copy {
    /// The unrelying "wire type". This is almost always some kind of
    /// unsigned integer.
    type Wire;

    /// Converts `self` into its underlying wire representation.
    fn to_wire_value(self) -> Self::Wire;

    /// Attempts to parse a value of `Self` from the underlying wire
    /// representation.
    fn from_wire_value(wire: Self::Wire) -> Option<Self>;

    /// Converts `self` into a string representation.
    fn name(self) -> &'static str;

    /// Attempts to convert a value of `Self` from a string representation.
    fn from_name(str: &str) -> Option<Self>;
}

/// A deserialization-from-string error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WireEnumFromStrError;

impl fmt::Display for WireEnumFromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown variant")
    }
}

/// A conveinence macro for generating `WireEnum`-implementing enums.
///
///
/// Syntax is as follows:
/// ```text
/// wire_enum! {
///     /// This is my enum.
///     pub enum MyEnum : u16 {
///         /// Variant `A`.
///         A = 0x0000,
///         /// Variant `B`.
///         B = 0x0001,
///     }
/// }
/// ```
/// This macro will generate an implementation of `WireEnum<Wire=u16>` for
/// the above enum, together with [`FromWire`] and [`ToWire`] impls that
/// reject values without a corresponding variant.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident : $wire:ident {
        $($(#[$meta_variant:meta])* $variant:ident = $value:tt,)*
    }) => {
        $(#[$meta])*
        #[repr($wire)]
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Deserialize, serde::Serialize)
        )]
        $vis enum $name {
           $(
               $(#[$meta_variant])*
               $variant = $value,
           )*
        }

        impl $crate::tpm::wire::WireEnum for $name {
            type Wire = $wire;
            fn to_wire_value(self) -> Self::Wire {
                match self {
                    $(
                        Self::$variant => $value,
                    )*
                }
            }
            fn from_wire_value(wire: Self::Wire) -> Option<Self> {
                match wire {
                    $(
                        $value => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(
                        Self::$variant => stringify!($variant),
                    )*
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(
                        stringify!($variant) => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }
        }

        impl $crate::tpm::wire::FromWire for $name {
            fn from_wire<R: $crate::io::Read>(
                r: &mut R,
            ) -> $crate::Result<Self, $crate::tpm::wire::Error> {
                use $crate::tpm::wire::WireEnum;

                let wire = $crate::tpm::wire::read_int::<$wire, R>(r)?;
                Self::from_wire_value(wire).ok_or_else(|| {
                    fail!(
                        $crate::tpm::wire::Error::OutOfRange,
                        "unknown {} value: {:#x}",
                        stringify!($name),
                        wire,
                    )
                })
            }
        }

        impl $crate::tpm::wire::ToWire for $name {
            fn to_wire<W: $crate::io::Write>(
                &self,
                mut w: W,
            ) -> $crate::Result<(), $crate::tpm::wire::Error> {
                use $crate::tpm::wire::WireEnum;

                $crate::tpm::wire::write_int(self.to_wire_value(), &mut w)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                use $crate::tpm::wire::WireEnum;

                write!(f, "{}", self.name())
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::tpm::wire::WireEnumFromStrError;

            fn from_str(
                s: &str
            ) -> core::result::Result<
                Self,
                $crate::tpm::wire::WireEnumFromStrError
            > {
                use $crate::tpm::wire::WireEnum;

                match $name::from_name(s) {
                    Some(val) => Ok(val),
                    None => Err($crate::tpm::wire::WireEnumFromStrError),
                }
            }
        }
    }
}
