// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Helper functions

use digest::Digest;

use crate::{Error, Result};

/// Size in bytes of a DPRF input and output.
pub const BLOCK_LEN: usize = 16;

/// A DPRF input or output.
pub type Block = [u8; BLOCK_LEN];

/// Payload that tells a peer's listener to stop serving.
pub(crate) const CLOSE_SENTINEL: u8 = 0;

///////////////////////
// Domain separation //
// ================= //
///////////////////////

pub(crate) const STR_HASH_TO_GROUP: &[u8] = b"HashToGroup-DPRF-";
pub(crate) const STR_CHALLENGE: &[u8] = b"Challenge-DPRF-";
pub(crate) const STR_FINALIZE: &[u8] = b"Finalize";

/// Returns `a ^ b`.
pub(crate) fn xor(a: &Block, b: &Block) -> Block {
    let mut out = *a;
    xor_in_place(&mut out, b);
    out
}

pub(crate) fn xor_in_place(dst: &mut Block, src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Splits a request payload into its 16-byte units.
///
/// # Errors
/// [`Error::MalformedRequest`] if the length is not a multiple of
/// [`BLOCK_LEN`].
pub(crate) fn split_blocks(bytes: &[u8]) -> Result<Vec<Block>> {
    if bytes.len() % BLOCK_LEN != 0 {
        return Err(Error::MalformedRequest);
    }

    Ok(bytes
        .chunks_exact(BLOCK_LEN)
        .map(|chunk| {
            let mut block = [0; BLOCK_LEN];
            block.copy_from_slice(chunk);
            block
        })
        .collect())
}

pub(crate) fn concat_blocks(blocks: &[Block]) -> Vec<u8> {
    blocks.concat()
}

/// Truncates `H(parts[0] || parts[1] || ...)` to one block.
pub(crate) fn random_oracle<H: Digest>(parts: &[&[u8]]) -> Block {
    let mut hasher = H::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();

    let mut block = [0; BLOCK_LEN];
    let len = digest.len().min(BLOCK_LEN);
    block[..len].copy_from_slice(&digest[..len]);
    block
}

/// Encodes a counter as a little-endian block.
pub(crate) fn counter_block(counter: u64) -> Block {
    u128::from(counter).to_le_bytes()
}
