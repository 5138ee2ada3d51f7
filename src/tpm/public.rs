// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Public areas of objects (`TPMT_PUBLIC`) and NV indices
//! (`TPMS_NV_PUBLIC`).
//!
//! Only the public parts of an entity are ever cached locally; they are what
//! its name is computed over.

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::AlgId;
use crate::tpm::Digest;
use crate::tpm::EccCurve;
use crate::tpm::EccParameter;
use crate::tpm::PublicKeyRsa;
use crate::tpm::TpmHandle;
use crate::Result;

/// A symmetric algorithm definition (`TPMT_SYM_DEF` and
/// `TPMT_SYM_DEF_OBJECT`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymDef {
    /// No symmetric algorithm.
    Null,
    /// XOR obfuscation, keyed by a hash function.
    Xor {
        /// The hash driving the obfuscation mask.
        hash: AlgId,
    },
    /// A block cipher.
    Block {
        /// The cipher, such as [`AlgId::Aes`].
        algorithm: AlgId,
        /// The key size, in bits.
        key_bits: u16,
        /// The mode of operation, such as [`AlgId::Cfb`].
        mode: AlgId,
    },
}

impl SymDef {
    /// AES-128 in CFB mode, the usual choice for parameter encryption.
    pub const AES_128_CFB: Self = Self::Block {
        algorithm: AlgId::Aes,
        key_bits: 128,
        mode: AlgId::Cfb,
    };

    /// Returns the algorithm identifier of this definition.
    pub fn algorithm(&self) -> AlgId {
        match self {
            Self::Null => AlgId::Null,
            Self::Xor { .. } => AlgId::Xor,
            Self::Block { algorithm, .. } => *algorithm,
        }
    }
}

impl Default for SymDef {
    fn default() -> Self {
        Self::Null
    }
}

impl FromWire for SymDef {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(match AlgId::from_wire(r)? {
            AlgId::Null => Self::Null,
            AlgId::Xor => Self::Xor {
                hash: AlgId::from_wire(r)?,
            },
            algorithm => Self::Block {
                algorithm,
                key_bits: wire::read_int(r)?,
                mode: AlgId::from_wire(r)?,
            },
        })
    }
}

impl ToWire for SymDef {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.algorithm().to_wire(&mut w)?;
        match self {
            Self::Null => Ok(()),
            Self::Xor { hash } => hash.to_wire(&mut w),
            Self::Block { key_bits, mode, .. } => {
                wire::write_int(*key_bits, &mut w)?;
                mode.to_wire(&mut w)
            }
        }
    }
}

/// An asymmetric signing or encryption scheme (`TPMT_RSA_SCHEME` and
/// `TPMT_ECC_SCHEME`).
///
/// `hash` and `count` are only meaningful for the schemes that carry them;
/// otherwise they are [`AlgId::Null`] and zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AsymScheme {
    /// The scheme itself.
    pub scheme: AlgId,
    /// The scheme's hash function.
    pub hash: AlgId,
    /// The commit counter, only present for ECDAA.
    pub count: u16,
}

impl AsymScheme {
    /// The null scheme.
    pub const NULL: Self = Self {
        scheme: AlgId::Null,
        hash: AlgId::Null,
        count: 0,
    };
}

impl FromWire for AsymScheme {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let mut scheme = Self::NULL;
        scheme.scheme = AlgId::from_wire(r)?;
        match scheme.scheme {
            AlgId::Null | AlgId::RsaEs => {}
            AlgId::EcDaa => {
                scheme.hash = AlgId::from_wire(r)?;
                scheme.count = wire::read_int(r)?;
            }
            _ => scheme.hash = AlgId::from_wire(r)?,
        }
        Ok(scheme)
    }
}

impl ToWire for AsymScheme {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.scheme.to_wire(&mut w)?;
        match self.scheme {
            AlgId::Null | AlgId::RsaEs => Ok(()),
            AlgId::EcDaa => {
                self.hash.to_wire(&mut w)?;
                wire::write_int(self.count, &mut w)
            }
            _ => self.hash.to_wire(&mut w),
        }
    }
}

/// A key derivation scheme (`TPMT_KDF_SCHEME`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KdfScheme {
    /// The KDF, or [`AlgId::Null`].
    pub scheme: AlgId,
    /// The KDF's hash function.
    pub hash: AlgId,
}

impl KdfScheme {
    /// The null scheme.
    pub const NULL: Self = Self {
        scheme: AlgId::Null,
        hash: AlgId::Null,
    };
}

impl FromWire for KdfScheme {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let scheme = AlgId::from_wire(r)?;
        let hash = match scheme {
            AlgId::Null => AlgId::Null,
            _ => AlgId::from_wire(r)?,
        };
        Ok(Self { scheme, hash })
    }
}

impl ToWire for KdfScheme {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.scheme.to_wire(&mut w)?;
        if self.scheme != AlgId::Null {
            self.hash.to_wire(&mut w)?;
        }
        Ok(())
    }
}

/// A keyed-hash object's scheme (`TPMT_KEYEDHASH_SCHEME`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyedHashScheme {
    /// [`AlgId::Hmac`], [`AlgId::Xor`] or [`AlgId::Null`].
    pub scheme: AlgId,
    /// The scheme's hash function.
    pub hash: AlgId,
    /// The KDF, only present for XOR.
    pub kdf: AlgId,
}

impl FromWire for KeyedHashScheme {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let mut scheme = Self {
            scheme: AlgId::from_wire(r)?,
            hash: AlgId::Null,
            kdf: AlgId::Null,
        };
        match scheme.scheme {
            AlgId::Null => {}
            AlgId::Xor => {
                scheme.hash = AlgId::from_wire(r)?;
                scheme.kdf = AlgId::from_wire(r)?;
            }
            _ => scheme.hash = AlgId::from_wire(r)?,
        }
        Ok(scheme)
    }
}

impl ToWire for KeyedHashScheme {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.scheme.to_wire(&mut w)?;
        match self.scheme {
            AlgId::Null => Ok(()),
            AlgId::Xor => {
                self.hash.to_wire(&mut w)?;
                self.kdf.to_wire(&mut w)
            }
            _ => self.hash.to_wire(&mut w),
        }
    }
}

/// An elliptic curve point (`TPMS_ECC_POINT`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EccPoint {
    /// The x coordinate.
    pub x: EccParameter,
    /// The y coordinate.
    pub y: EccParameter,
}

impl FromWire for EccPoint {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self {
            x: EccParameter::from_wire(r)?,
            y: EccParameter::from_wire(r)?,
        })
    }
}

impl ToWire for EccPoint {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.x.to_wire(&mut w)?;
        self.y.to_wire(&mut w)
    }
}

/// The type-specific part of a public area: the algorithm parameters
/// (`TPMU_PUBLIC_PARMS`) together with the unique identifier
/// (`TPMU_PUBLIC_ID`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parameters {
    /// An RSA key.
    Rsa {
        /// The symmetric algorithm for child objects.
        symmetric: SymDef,
        /// The signing or encryption scheme.
        scheme: AsymScheme,
        /// The modulus size, in bits.
        key_bits: u16,
        /// The public exponent; zero stands for 65537.
        exponent: u32,
        /// The modulus.
        modulus: PublicKeyRsa,
    },
    /// An elliptic curve key.
    Ecc {
        /// The symmetric algorithm for child objects.
        symmetric: SymDef,
        /// The signing or key exchange scheme.
        scheme: AsymScheme,
        /// The curve.
        curve: EccCurve,
        /// The key derivation scheme.
        kdf: KdfScheme,
        /// The public point.
        point: EccPoint,
    },
    /// A keyed-hash object.
    KeyedHash {
        /// The HMAC or XOR scheme.
        scheme: KeyedHashScheme,
        /// The digest binding the object's sensitive part.
        unique: Digest,
    },
    /// A symmetric cipher key.
    SymCipher {
        /// The cipher definition.
        symmetric: SymDef,
        /// The digest binding the object's sensitive part.
        unique: Digest,
    },
}

impl Parameters {
    /// Returns the object type (`TPMI_ALG_PUBLIC`) of these parameters.
    pub fn algorithm(&self) -> AlgId {
        match self {
            Self::Rsa { .. } => AlgId::Rsa,
            Self::Ecc { .. } => AlgId::Ecc,
            Self::KeyedHash { .. } => AlgId::KeyedHash,
            Self::SymCipher { .. } => AlgId::SymCipher,
        }
    }
}

/// An object's public area (`TPMT_PUBLIC`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Public {
    /// The algorithm the object's name is computed with.
    pub name_alg: AlgId,
    /// The object attribute bits (`TPMA_OBJECT`).
    pub object_attributes: u32,
    /// The object's policy digest.
    pub auth_policy: Digest,
    /// Type-specific parameters and identity.
    pub parameters: Parameters,
}

impl FromWire for Public {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let ty = AlgId::from_wire(r)?;
        let name_alg = AlgId::from_wire(r)?;
        let object_attributes = wire::read_int(r)?;
        let auth_policy = Digest::from_wire(r)?;

        let parameters = match ty {
            AlgId::Rsa => {
                let symmetric = SymDef::from_wire(r)?;
                let scheme = AsymScheme::from_wire(r)?;
                let key_bits = wire::read_int(r)?;
                let exponent = wire::read_int(r)?;
                Parameters::Rsa {
                    symmetric,
                    scheme,
                    key_bits,
                    exponent,
                    modulus: PublicKeyRsa::from_wire(r)?,
                }
            }
            AlgId::Ecc => {
                let symmetric = SymDef::from_wire(r)?;
                let scheme = AsymScheme::from_wire(r)?;
                let curve = EccCurve::from_wire(r)?;
                let kdf = KdfScheme::from_wire(r)?;
                Parameters::Ecc {
                    symmetric,
                    scheme,
                    curve,
                    kdf,
                    point: EccPoint::from_wire(r)?,
                }
            }
            AlgId::KeyedHash => {
                let scheme = KeyedHashScheme::from_wire(r)?;
                Parameters::KeyedHash {
                    scheme,
                    unique: Digest::from_wire(r)?,
                }
            }
            AlgId::SymCipher => {
                let symmetric = SymDef::from_wire(r)?;
                Parameters::SymCipher {
                    symmetric,
                    unique: Digest::from_wire(r)?,
                }
            }
            ty => {
                return Err(fail!(
                    wire::Error::OutOfRange,
                    "not a public object type: {}",
                    ty,
                ))
            }
        };

        Ok(Self {
            name_alg,
            object_attributes,
            auth_policy,
            parameters,
        })
    }
}

impl ToWire for Public {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.parameters.algorithm().to_wire(&mut w)?;
        self.name_alg.to_wire(&mut w)?;
        wire::write_int(self.object_attributes, &mut w)?;
        self.auth_policy.to_wire(&mut w)?;

        match &self.parameters {
            Parameters::Rsa {
                symmetric,
                scheme,
                key_bits,
                exponent,
                modulus,
            } => {
                symmetric.to_wire(&mut w)?;
                scheme.to_wire(&mut w)?;
                wire::write_int(*key_bits, &mut w)?;
                wire::write_int(*exponent, &mut w)?;
                modulus.to_wire(&mut w)
            }
            Parameters::Ecc {
                symmetric,
                scheme,
                curve,
                kdf,
                point,
            } => {
                symmetric.to_wire(&mut w)?;
                scheme.to_wire(&mut w)?;
                curve.to_wire(&mut w)?;
                kdf.to_wire(&mut w)?;
                point.to_wire(&mut w)
            }
            Parameters::KeyedHash { scheme, unique } => {
                scheme.to_wire(&mut w)?;
                unique.to_wire(&mut w)
            }
            Parameters::SymCipher { symmetric, unique } => {
                symmetric.to_wire(&mut w)?;
                unique.to_wire(&mut w)
            }
        }
    }
}

/// An NV index's public area (`TPMS_NV_PUBLIC`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NvPublic {
    /// The index's handle.
    pub nv_index: TpmHandle,
    /// The algorithm the index's name is computed with.
    pub name_alg: AlgId,
    /// The index attribute bits (`TPMA_NV`).
    pub attributes: u32,
    /// The index's policy digest.
    pub auth_policy: Digest,
    /// The size of the index's data area.
    pub data_size: u16,
}

impl FromWire for NvPublic {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self {
            nv_index: TpmHandle::from_wire(r)?,
            name_alg: AlgId::from_wire(r)?,
            attributes: wire::read_int(r)?,
            auth_policy: Digest::from_wire(r)?,
            data_size: wire::read_int(r)?,
        })
    }
}

impl ToWire for NvPublic {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.nv_index.to_wire(&mut w)?;
        self.name_alg.to_wire(&mut w)?;
        wire::write_int(self.attributes, &mut w)?;
        self.auth_policy.to_wire(&mut w)?;
        wire::write_int(self.data_size, &mut w)
    }
}
