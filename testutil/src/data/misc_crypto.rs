// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Known answers for hash, HMAC and cipher primitives.

/// Plaintext used as both message and key.
pub const PLAIN_TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog, twice over.";

/// SHA-1 of [`PLAIN_TEXT`].
#[rustfmt::skip]
pub const PLAIN_TEXT_DIGEST_SHA1: &[u8] = &[
    0x13, 0xd0, 0xb6, 0x4a, 0xf9, 0x28, 0xf4, 0xac, 0xc5, 0x52, 0x8b, 0x24,
    0x02, 0xd0, 0xb1, 0x50, 0xf1, 0x85, 0x10, 0x34,
];
/// SHA-256 of [`PLAIN_TEXT`].
#[rustfmt::skip]
pub const PLAIN_TEXT_DIGEST_SHA256: &[u8] = &[
    0x53, 0xd4, 0xbb, 0x47, 0xd1, 0x96, 0x09, 0x47, 0xe7, 0xc3, 0x0c, 0x37,
    0xda, 0x16, 0xdd, 0xb7, 0x1c, 0x3a, 0xeb, 0xc5, 0xaf, 0x53, 0xf6, 0x4e,
    0x65, 0x01, 0x13, 0x84, 0x95, 0xcd, 0xee, 0x97,
];
/// SHA-384 of [`PLAIN_TEXT`].
#[rustfmt::skip]
pub const PLAIN_TEXT_DIGEST_SHA384: &[u8] = &[
    0xf3, 0xb7, 0xc5, 0xf6, 0x11, 0xe6, 0x2d, 0xed, 0x31, 0xb7, 0x51, 0x7f,
    0x3d, 0xe1, 0xfa, 0x74, 0xfd, 0x36, 0x05, 0xc9, 0xcc, 0x71, 0x22, 0x12,
    0xe4, 0x2a, 0xe3, 0xdf, 0x1a, 0xf7, 0xe5, 0x20, 0x5a, 0x97, 0x73, 0xa2,
    0xe6, 0x6f, 0x1c, 0x93, 0xba, 0xe8, 0xa0, 0xef, 0x5d, 0x8b, 0xe4, 0x2c,
];
/// HMAC-SHA-1 of [`PLAIN_TEXT`], keyed with itself.
#[rustfmt::skip]
pub const PLAIN_TEXT_HMAC_SHA1: &[u8] = &[
    0x1e, 0x56, 0x15, 0x0c, 0xa6, 0xfb, 0xf3, 0x84, 0xcd, 0x7f, 0xa2, 0x24,
    0x6c, 0xd7, 0xfe, 0x07, 0x36, 0x73, 0x0e, 0x98,
];
/// HMAC-SHA-256 of [`PLAIN_TEXT`], keyed with itself.
#[rustfmt::skip]
pub const PLAIN_TEXT_HMAC_SHA256: &[u8] = &[
    0x9b, 0xa7, 0x4a, 0xd1, 0x74, 0x41, 0xdd, 0xe7, 0x98, 0xed, 0xbc, 0xee,
    0x72, 0xec, 0x11, 0x45, 0x53, 0xfb, 0x7c, 0x55, 0x9a, 0x7d, 0x2e, 0xb2,
    0x38, 0xdf, 0x71, 0x0a, 0xf7, 0x2f, 0xb5, 0x0b,
];
/// HMAC-SHA-512 of [`PLAIN_TEXT`], keyed with itself.
#[rustfmt::skip]
pub const PLAIN_TEXT_HMAC_SHA512: &[u8] = &[
    0xad, 0x6d, 0xb5, 0xee, 0x36, 0xbd, 0x0a, 0x7e, 0x46, 0x68, 0x39, 0xaf,
    0x71, 0x4d, 0x63, 0xb3, 0x7e, 0xa3, 0x8a, 0x8d, 0x45, 0x11, 0xe7, 0xd2,
    0xbf, 0x05, 0x22, 0x10, 0x3e, 0x06, 0x61, 0x46, 0x0a, 0x2a, 0x9c, 0x59,
    0x20, 0xca, 0xe0, 0x57, 0x79, 0xa6, 0x08, 0x78, 0x09, 0xe4, 0x5e, 0x76,
    0xae, 0x4e, 0x28, 0xdc, 0xdd, 0x29, 0x48, 0x4a, 0x33, 0x1e, 0x9e, 0x51,
    0x40, 0x86, 0xef, 0xd3,
];

/// An AES-128 key.
#[rustfmt::skip]
pub const AES128_CFB_KEY: &[u8] = &[
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
    0x0c, 0x0d, 0x0e, 0x0f,
];
/// An initialization vector for [`AES128_CFB_KEY`].
#[rustfmt::skip]
pub const AES128_CFB_IV: &[u8] = &[
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b,
    0x1c, 0x1d, 0x1e, 0x1f,
];
/// A plaintext that is not a multiple of the block size.
#[rustfmt::skip]
pub const AES128_CFB_PLAINTEXT: &[u8] = &[
    0x70, 0x61, 0x72, 0x61, 0x6d, 0x65, 0x74, 0x65, 0x72, 0x20, 0x65, 0x6e,
    0x63, 0x72, 0x79, 0x70, 0x74, 0x69, 0x6f, 0x6e,
];
/// [`AES128_CFB_PLAINTEXT`] encrypted with AES-128-CFB.
#[rustfmt::skip]
pub const AES128_CFB_CIPHERTEXT: &[u8] = &[
    0x77, 0x9f, 0x9d, 0x15, 0x8c, 0xb0, 0x77, 0x0b, 0xe2, 0x2e, 0x8b, 0x7f,
    0xed, 0xe6, 0xeb, 0xe3, 0xe3, 0xf3, 0x63, 0xdc,
];
