// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The TPM key derivation functions.
//!
//! Two KDFs are used by sessions, both defined in the TPM 2.0 architecture
//! document and both built out of a [`hash::Engine`]:
//! - KDFa, the SP800-108 counter-mode KDF with HMAC as the PRF. Every block
//!   is `HMAC(key, i ‖ label ‖ 0 ‖ contextU ‖ contextV ‖ bits)`.
//! - KDFe, the SP800-56A concatenation KDF. Every block is
//!   `H(i ‖ Z ‖ label ‖ 0 ‖ partyU ‖ partyV)`.
//!
//! In both, `i` is a 32-bit big-endian block counter starting at one, and
//! the output is the concatenation of the blocks, truncated to the requested
//! length. Labels are passed without their terminating zero byte; the KDF
//! appends it.

use core::cmp::min;

use crate::crypto::hash;
use crate::crypto::hash::EngineExt as _;
use crate::tpm::buf::MAX_DIGEST_SIZE;
use crate::Result;

/// Runs `block` for every block needed to produce `len` bytes, passing each
/// (possibly truncated) output block to `sink` along with its offset.
fn for_each_block(
    algo: hash::Algo,
    len: usize,
    mut block: impl FnMut(u32, &mut [u8]) -> Result<(), hash::Error>,
    mut sink: impl FnMut(usize, &[u8]),
) -> Result<(), hash::Error> {
    let mut buf = [0; MAX_DIGEST_SIZE];
    let buf = &mut buf[..algo.bytes()];

    let mut counter = 1u32;
    let mut offset = 0;
    while offset < len {
        block(counter, buf)?;
        let n = min(buf.len(), len - offset);
        sink(offset, &buf[..n]);
        offset += n;
        counter += 1;
    }
    Ok(())
}

fn kdfa_blocks(
    engine: &mut dyn hash::Engine,
    algo: hash::Algo,
    key: &[u8],
    label: &[u8],
    context_u: &[u8],
    context_v: &[u8],
    len: usize,
    sink: impl FnMut(usize, &[u8]),
) -> Result<(), hash::Error> {
    let bits = (len as u32) * 8;
    for_each_block(
        algo,
        len,
        |i, out| {
            let mut h = engine.new_hmac(algo, key)?;
            h.write_u32(i)?;
            h.write_parts(&[label, &[0], context_u, context_v])?;
            h.write_u32(bits)?;
            h.finish(out)
        },
        sink,
    )
}

/// Fills `out` with KDFa output; the requested bit count is
/// `out.len() * 8`.
pub fn kdfa(
    engine: &mut dyn hash::Engine,
    algo: hash::Algo,
    key: &[u8],
    label: &[u8],
    context_u: &[u8],
    context_v: &[u8],
    out: &mut [u8],
) -> Result<(), hash::Error> {
    let len = out.len();
    kdfa_blocks(
        engine,
        algo,
        key,
        label,
        context_u,
        context_v,
        len,
        |offset, block| {
            out[offset..offset + block.len()].copy_from_slice(block)
        },
    )
}

/// XORs `buf` with a KDFa mask of the same length.
///
/// This is the TPM's XOR parameter obfuscation; applying it twice with the
/// same inputs is the identity.
pub fn kdfa_xor(
    engine: &mut dyn hash::Engine,
    algo: hash::Algo,
    key: &[u8],
    label: &[u8],
    context_u: &[u8],
    context_v: &[u8],
    buf: &mut [u8],
) -> Result<(), hash::Error> {
    let len = buf.len();
    kdfa_blocks(
        engine,
        algo,
        key,
        label,
        context_u,
        context_v,
        len,
        |offset, block| {
            for (b, m) in buf[offset..].iter_mut().zip(block) {
                *b ^= m;
            }
        },
    )
}

/// Fills `out` with KDFe output over the shared secret `z`.
pub fn kdfe(
    engine: &mut dyn hash::Engine,
    algo: hash::Algo,
    z: &[u8],
    label: &[u8],
    party_u: &[u8],
    party_v: &[u8],
    out: &mut [u8],
) -> Result<(), hash::Error> {
    let len = out.len();
    for_each_block(
        algo,
        len,
        |i, block| {
            let mut h = engine.new_hash(algo)?;
            h.write_u32(i)?;
            h.write_parts(&[z, label, &[0], party_u, party_v])?;
            h.finish(block)
        },
        |offset, block| {
            out[offset..offset + block.len()].copy_from_slice(block)
        },
    )
}
