// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Key material intended only for testing.

/// The modulus of a test-only 2048-bit RSA key with exponent 65537.
#[rustfmt::skip]
pub const RSA2048_MODULUS: &[u8] = &[
    0xb0, 0x06, 0xd1, 0x8b, 0x16, 0xd9, 0x90, 0x2a, 0xd2, 0xbe, 0x13, 0xad,
    0xbc, 0x2b, 0x1a, 0x43, 0xb1, 0x23, 0x57, 0x16, 0x73, 0xee, 0x56, 0x64,
    0x15, 0xb8, 0x19, 0x16, 0x7a, 0xb6, 0x9a, 0xa3, 0x53, 0xe6, 0x61, 0xeb,
    0x4b, 0xd0, 0x5d, 0x78, 0xff, 0x49, 0xf8, 0xdf, 0xde, 0x8e, 0xc4, 0xdc,
    0x1d, 0xd1, 0xbc, 0xa6, 0x2e, 0xb7, 0x34, 0x6c, 0x1f, 0x91, 0xc2, 0xb8,
    0xa5, 0x63, 0x3e, 0x42, 0x07, 0x58, 0xdc, 0xd9, 0x65, 0xb8, 0xf2, 0xd3,
    0x10, 0xbd, 0x44, 0xe2, 0x4c, 0x1e, 0x2e, 0x0a, 0xf7, 0xcd, 0xd9, 0x0b,
    0x3d, 0x66, 0x95, 0x25, 0x0d, 0xcc, 0x4b, 0xd2, 0xf6, 0x0f, 0x5b, 0x2d,
    0x1d, 0x95, 0x2e, 0xd1, 0x4d, 0x2c, 0x4e, 0x74, 0x0f, 0x31, 0xdc, 0x9b,
    0x3a, 0x3e, 0x9e, 0x7f, 0x66, 0x9a, 0x00, 0xd8, 0xa1, 0xa7, 0xc6, 0x0d,
    0x9e, 0x5c, 0x5b, 0xe2, 0x21, 0x21, 0x7e, 0x62, 0xa5, 0x45, 0x7e, 0x9a,
    0x03, 0x97, 0x4d, 0x73, 0x1a, 0x2b, 0xee, 0xa5, 0xe5, 0x14, 0x90, 0x23,
    0x9a, 0x7d, 0x6a, 0xe6, 0x5a, 0xdd, 0x12, 0xe2, 0x08, 0x59, 0xde, 0x20,
    0xa5, 0xf4, 0x32, 0x3e, 0xa0, 0x7a, 0xfe, 0x1e, 0x0e, 0xc0, 0x16, 0x99,
    0x65, 0x31, 0x84, 0x46, 0xdd, 0x20, 0xb6, 0xcc, 0x90, 0x2f, 0x45, 0x44,
    0x62, 0x39, 0xf8, 0x49, 0xed, 0xa0, 0x8d, 0x38, 0x8e, 0xc6, 0xbc, 0x48,
    0x67, 0x8f, 0x0c, 0xfb, 0xa9, 0x0d, 0xd4, 0x73, 0x1b, 0x12, 0x44, 0xef,
    0xba, 0xb1, 0x60, 0x19, 0x65, 0xcd, 0x1b, 0xbe, 0xea, 0x3e, 0x2e, 0xaa,
    0x91, 0x35, 0xbf, 0x38, 0x39, 0x4c, 0x88, 0x5b, 0x97, 0xc9, 0x9f, 0x38,
    0x37, 0x38, 0xd8, 0xb6, 0xec, 0x2b, 0x06, 0x0f, 0x58, 0x5e, 0x19, 0x50,
    0xc4, 0x02, 0xd0, 0x57, 0x36, 0x9a, 0x4c, 0xf8, 0x8c, 0x05, 0xf5, 0xa3,
    0xf1, 0x50, 0x98, 0xf3,
];
/// The private exponent of the [`RSA2048_MODULUS`] key.
#[rustfmt::skip]
pub const RSA2048_PRIVATE_EXPONENT: &[u8] = &[
    0x12, 0x88, 0x65, 0x3f, 0x73, 0xa4, 0x6c, 0x5d, 0x55, 0xda, 0xd5, 0x4f,
    0x91, 0x64, 0x28, 0x5b, 0xc0, 0x26, 0xac, 0x60, 0x9c, 0xcc, 0x17, 0x24,
    0x6a, 0x74, 0xfb, 0x8f, 0x36, 0x54, 0x4b, 0x6b, 0xae, 0xc5, 0xae, 0xc1,
    0x8b, 0x35, 0xe0, 0xe1, 0x80, 0x5f, 0x55, 0x68, 0x9c, 0x92, 0x03, 0x7f,
    0xf9, 0x53, 0xbf, 0xbc, 0xef, 0x66, 0x32, 0x8a, 0xbf, 0xb8, 0x24, 0xfc,
    0x33, 0xcd, 0x83, 0x1c, 0x88, 0x91, 0x7e, 0x8f, 0x14, 0xfa, 0xa7, 0xf6,
    0x38, 0xe8, 0xf4, 0x7b, 0xae, 0xef, 0xee, 0x81, 0x11, 0x1e, 0x07, 0x1f,
    0xfb, 0xd2, 0xf5, 0x18, 0xf5, 0x9e, 0xf0, 0xcc, 0xc1, 0x43, 0x54, 0xa2,
    0x27, 0x5f, 0x31, 0x92, 0xaf, 0xc1, 0x5e, 0x71, 0x31, 0xb8, 0x5a, 0x35,
    0xad, 0xa8, 0x32, 0x1f, 0xcf, 0xb9, 0x9f, 0x25, 0x2f, 0xbf, 0xee, 0x46,
    0x38, 0xca, 0x18, 0x92, 0x72, 0x52, 0x88, 0x6f, 0xc5, 0xab, 0x75, 0x90,
    0xea, 0xb4, 0xaa, 0xdc, 0x4d, 0x71, 0x3c, 0x93, 0xa6, 0x10, 0xea, 0x08,
    0x43, 0x2f, 0x89, 0x3a, 0xb8, 0x3d, 0x98, 0xd3, 0x80, 0xbd, 0x48, 0x0f,
    0x94, 0xba, 0xd2, 0xb1, 0xb4, 0x93, 0x09, 0xc0, 0x71, 0x94, 0x25, 0xe5,
    0x5f, 0xc3, 0xf9, 0xac, 0x73, 0x02, 0x8b, 0xd9, 0xe8, 0xdd, 0x2f, 0x69,
    0x59, 0xeb, 0xe9, 0x7a, 0xc5, 0x1a, 0x42, 0x6a, 0xbc, 0x95, 0x4d, 0xe0,
    0xd1, 0x7a, 0xbc, 0x87, 0x56, 0x52, 0xdd, 0x1e, 0x54, 0x3d, 0x04, 0x31,
    0x4f, 0x37, 0x5c, 0x10, 0xd9, 0x85, 0xd0, 0xd4, 0xa9, 0xe7, 0xdc, 0x2a,
    0xd5, 0xb7, 0x07, 0xa4, 0x69, 0x45, 0x57, 0x5e, 0x25, 0x1d, 0x22, 0x75,
    0x5a, 0xcd, 0xca, 0xae, 0x8e, 0x5f, 0x39, 0xdc, 0x45, 0xa2, 0x59, 0x7c,
    0x6a, 0x68, 0x18, 0xe4, 0x4f, 0xa6, 0xb3, 0x99, 0x3f, 0x08, 0x30, 0xb6,
    0x0e, 0x23, 0x6b, 0x01,
];
/// The first prime factor of [`RSA2048_MODULUS`].
#[rustfmt::skip]
pub const RSA2048_PRIME1: &[u8] = &[
    0xd5, 0x4b, 0x0d, 0x99, 0xea, 0x5c, 0xcf, 0x20, 0xcd, 0xc8, 0xa7, 0x03,
    0x37, 0x99, 0x93, 0x87, 0x1e, 0xfe, 0xc4, 0x62, 0x26, 0x79, 0xcd, 0x67,
    0x7e, 0xc1, 0x8e, 0xf8, 0xb8, 0x2c, 0xfb, 0xc1, 0x1c, 0x84, 0xd0, 0x66,
    0x51, 0xd6, 0xc6, 0x2c, 0x24, 0xaf, 0xde, 0x14, 0x56, 0x41, 0x4b, 0xed,
    0x6b, 0x3d, 0xf4, 0xa3, 0xb2, 0x15, 0xe4, 0x16, 0x19, 0x44, 0x38, 0xc7,
    0xdd, 0x16, 0xe0, 0xcc, 0x22, 0x3b, 0x9a, 0x7a, 0x54, 0x83, 0x8d, 0xe7,
    0xf7, 0xaf, 0x0a, 0x1a, 0x57, 0x56, 0x90, 0x29, 0x1e, 0x3e, 0xb3, 0xa8,
    0x5e, 0xb9, 0x45, 0x9e, 0xf0, 0xb3, 0x7e, 0x13, 0x56, 0xb4, 0xb5, 0x61,
    0x78, 0x9f, 0x74, 0xa7, 0x46, 0xcb, 0x60, 0x7d, 0x15, 0xb1, 0xbc, 0x66,
    0x34, 0x79, 0x77, 0xcb, 0x44, 0x6c, 0x1b, 0xf2, 0x5c, 0xe2, 0x03, 0x4c,
    0xe9, 0x75, 0xd2, 0x95, 0xed, 0xe9, 0xd9, 0x53,
];
/// The second prime factor of [`RSA2048_MODULUS`].
#[rustfmt::skip]
pub const RSA2048_PRIME2: &[u8] = &[
    0xd3, 0x45, 0x90, 0x26, 0xd2, 0x87, 0x4f, 0x3d, 0xa8, 0xa3, 0x9c, 0xef,
    0x9a, 0x2a, 0xb2, 0x11, 0x61, 0x87, 0xfc, 0x10, 0x18, 0xc5, 0xc5, 0xf5,
    0x10, 0x05, 0x81, 0x94, 0xfa, 0x4d, 0xb0, 0x9b, 0xd1, 0x40, 0xe3, 0x88,
    0xb7, 0xd7, 0xf8, 0x5d, 0x9b, 0x93, 0xd9, 0x87, 0xaf, 0xb8, 0xb9, 0xce,
    0x7f, 0x0e, 0xfc, 0x63, 0x32, 0xd6, 0xee, 0x1c, 0x6f, 0x1c, 0x16, 0x84,
    0x9e, 0x18, 0x8a, 0x60, 0x8a, 0xf1, 0xde, 0xc3, 0xb5, 0xd0, 0x0c, 0x07,
    0x01, 0xb9, 0x4a, 0x08, 0x76, 0x2d, 0x6d, 0x3d, 0xb0, 0x3b, 0x5c, 0x45,
    0xa2, 0xf2, 0xa7, 0x59, 0x9e, 0x5c, 0xa8, 0x4e, 0x8d, 0xa3, 0xd2, 0x41,
    0x0a, 0xb6, 0x20, 0xf9, 0xd0, 0xb3, 0x50, 0x4a, 0xb7, 0x8a, 0x0c, 0x89,
    0x40, 0x70, 0x2a, 0x3f, 0xc0, 0x6c, 0x49, 0x60, 0xd2, 0xc8, 0x0b, 0xef,
    0x81, 0xdc, 0x47, 0x54, 0xb2, 0x77, 0x2d, 0xe1,
];
