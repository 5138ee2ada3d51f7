// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Known answers for the TPM key derivation functions (KDFa and KDFe).

/// The HMAC key for the KDFa vectors.
pub const KEY: &[u8] = &[
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c,
    0x0d, 0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f, 0x20,
];
/// The first context value.
pub const PARTY_U: &[u8] = &[0xaa; 32];
/// The second context value.
pub const PARTY_V: &[u8] = &[0x55; 20];
/// The shared secret for the KDFe vectors.
pub const SHARED_Z: &[u8] = &[
    0x40, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x4b,
    0x4c, 0x4d, 0x4e, 0x4f, 0x50, 0x51, 0x52, 0x53, 0x54, 0x55, 0x56, 0x57,
    0x58, 0x59, 0x5a, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f,
];

/// KDFa(SHA-256, [`KEY`], "ATH", [`PARTY_U`], [`PARTY_V`], 256).
#[rustfmt::skip]
pub const KDFA_SHA256_ATH: &[u8] = &[
    0x86, 0xc0, 0xb0, 0x47, 0xf5, 0xf7, 0xc2, 0x2e, 0x54, 0x64, 0x70, 0xe5,
    0xcd, 0x2a, 0xec, 0x06, 0x3f, 0x03, 0x5a, 0x57, 0x2a, 0xb1, 0xca, 0xaa,
    0xdb, 0x0e, 0x8e, 0x72, 0x26, 0x8b, 0xc4, 0x59,
];
/// KDFa(SHA-1, `KEY[..20]`, "CFB", `PARTY_U[..20]`, [`PARTY_V`], 256), spanning two blocks.
#[rustfmt::skip]
pub const KDFA_SHA1_CFB: &[u8] = &[
    0xbc, 0xa6, 0x86, 0x68, 0x9a, 0x08, 0x46, 0xef, 0xbd, 0xa3, 0x8c, 0xa5,
    0xf8, 0x08, 0x6e, 0x6f, 0x32, 0x2b, 0xcf, 0x54, 0x3e, 0x52, 0x3c, 0x38,
    0xdf, 0x42, 0xc9, 0x0e, 0x18, 0x8e, 0xf2, 0x5b,
];
/// KDFa(SHA-256, [`KEY`], "XOR", [`PARTY_U`], [`PARTY_V`], 40).
#[rustfmt::skip]
pub const KDFA_SHA256_XOR_5: &[u8] = &[
    0x74, 0xd0, 0xb6, 0xcd, 0x56,
];
/// KDFe(SHA-256, [`SHARED_Z`], "SECRET", [`PARTY_U`], [`PARTY_V`], 256).
#[rustfmt::skip]
pub const KDFE_SHA256_SECRET: &[u8] = &[
    0x1a, 0x0c, 0x74, 0xee, 0x73, 0x11, 0x2b, 0xf9, 0x93, 0x5f, 0xc0, 0x8b,
    0x3d, 0x3d, 0x0f, 0xcc, 0xa1, 0x99, 0x50, 0x3c, 0x80, 0xf1, 0x89, 0x44,
    0x66, 0xb9, 0xa9, 0x77, 0x7f, 0x3b, 0x8c, 0x1f,
];
/// KDFe(SHA-384, [`SHARED_Z`], "SECRET", [`PARTY_U`], [`PARTY_V`], 160).
#[rustfmt::skip]
pub const KDFE_SHA384_SECRET_20: &[u8] = &[
    0x44, 0xb0, 0x7a, 0xd2, 0xa7, 0x70, 0xf8, 0x84, 0x25, 0x7f, 0xea, 0xef,
    0x5d, 0x5c, 0xea, 0xe5, 0x3b, 0x41, 0xf9, 0x1e,
];
