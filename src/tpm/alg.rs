// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Algorithm identifiers and other small TPM enumerations.

use crate::crypto::ecdh;
use crate::crypto::hash;

wire_enum! {
    /// A TPM algorithm identifier (`TPM_ALG_ID`).
    #[allow(non_camel_case_types)]
    pub enum AlgId: u16 {
        /// RSA.
        Rsa = 0x0001,
        /// Triple DES.
        Tdes = 0x0003,
        /// SHA-1.
        Sha1 = 0x0004,
        /// HMAC.
        Hmac = 0x0005,
        /// AES.
        Aes = 0x0006,
        /// The MGF1 mask generation function.
        Mgf1 = 0x0007,
        /// A keyed-hash object.
        KeyedHash = 0x0008,
        /// XOR parameter obfuscation.
        Xor = 0x000a,
        /// 256-bit SHA-2.
        Sha256 = 0x000b,
        /// 384-bit SHA-2.
        Sha384 = 0x000c,
        /// 512-bit SHA-2.
        Sha512 = 0x000d,
        /// The null algorithm.
        Null = 0x0010,
        /// SM3.
        Sm3_256 = 0x0012,
        /// SM4.
        Sm4 = 0x0013,
        /// RSASSA-PKCS1-v1_5 signatures.
        RsaSsa = 0x0014,
        /// RSAES-PKCS1-v1_5 encryption.
        RsaEs = 0x0015,
        /// RSASSA-PSS signatures.
        RsaPss = 0x0016,
        /// RSAES-OAEP encryption.
        Oaep = 0x0017,
        /// ECDSA signatures.
        EcDsa = 0x0018,
        /// ECDH key agreement.
        EcDh = 0x0019,
        /// ECDAA signatures.
        EcDaa = 0x001a,
        /// SM2 signatures.
        Sm2 = 0x001b,
        /// EC-Schnorr signatures.
        EcSchnorr = 0x001c,
        /// ECMQV key agreement.
        EcMqv = 0x001d,
        /// The SP800-56A concatenation KDF.
        Kdf1Sp800_56A = 0x0020,
        /// The IEEE 1363a KDF2.
        Kdf2 = 0x0021,
        /// The SP800-108 counter-mode KDF.
        Kdf1Sp800_108 = 0x0022,
        /// An elliptic-curve key.
        Ecc = 0x0023,
        /// A symmetric-cipher object.
        SymCipher = 0x0025,
        /// Camellia.
        Camellia = 0x0026,
        /// 256-bit SHA-3.
        Sha3_256 = 0x0027,
        /// 384-bit SHA-3.
        Sha3_384 = 0x0028,
        /// 512-bit SHA-3.
        Sha3_512 = 0x0029,
        /// Counter mode.
        Ctr = 0x0040,
        /// Output feedback mode.
        Ofb = 0x0041,
        /// Cipher block chaining mode.
        Cbc = 0x0042,
        /// Cipher feedback mode.
        Cfb = 0x0043,
        /// Electronic codebook mode.
        Ecb = 0x0044,
    }
}

impl AlgId {
    /// Returns the hash function this identifier names, if it names one that
    /// [`hash::Algo`] can express.
    pub fn hash(self) -> Option<hash::Algo> {
        match self {
            Self::Sha1 => Some(hash::Algo::Sha1),
            Self::Sha256 => Some(hash::Algo::Sha256),
            Self::Sha384 => Some(hash::Algo::Sha384),
            Self::Sha512 => Some(hash::Algo::Sha512),
            _ => None,
        }
    }
}

impl From<hash::Algo> for AlgId {
    fn from(algo: hash::Algo) -> Self {
        match algo {
            hash::Algo::Sha1 => Self::Sha1,
            hash::Algo::Sha256 => Self::Sha256,
            hash::Algo::Sha384 => Self::Sha384,
            hash::Algo::Sha512 => Self::Sha512,
        }
    }
}

wire_enum! {
    /// An elliptic curve identifier (`TPM_ECC_CURVE`).
    pub enum EccCurve: u16 {
        /// NIST P-192.
        NistP192 = 0x0001,
        /// NIST P-224.
        NistP224 = 0x0002,
        /// NIST P-256.
        NistP256 = 0x0003,
        /// NIST P-384.
        NistP384 = 0x0004,
        /// NIST P-521.
        NistP521 = 0x0005,
        /// The 256-bit Barreto-Naehrig curve.
        BnP256 = 0x0010,
        /// The 638-bit Barreto-Naehrig curve.
        BnP638 = 0x0011,
        /// The SM2 curve.
        Sm2P256 = 0x0020,
    }
}

impl EccCurve {
    /// Returns the key agreement curve corresponding to this identifier, if
    /// [`ecdh::Curve`] can express it.
    pub fn ecdh(self) -> Option<ecdh::Curve> {
        match self {
            Self::NistP256 => Some(ecdh::Curve::P256),
            Self::NistP384 => Some(ecdh::Curve::P384),
            _ => None,
        }
    }
}

wire_enum! {
    /// The kind of session requested from `TPM2_StartAuthSession`
    /// (`TPM_SE`).
    pub enum SessionType: u8 {
        /// An HMAC session.
        Hmac = 0x00,
        /// A policy session.
        Policy = 0x01,
        /// A trial policy session, only usable for computing policy digests.
        Trial = 0x03,
    }
}

wire_enum! {
    /// The tag at the start of every command and response (`TPM_ST`).
    pub enum StructureTag: u16 {
        /// Tag used by a TPM to respond to a malformed command header.
        RspCommand = 0x00c4,
        /// A command or response without an authorization area.
        NoSessions = 0x8001,
        /// A command or response with an authorization area.
        Sessions = 0x8002,
    }
}
