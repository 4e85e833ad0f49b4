// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! AES-128 helpers shared by the symmetric scheme and the encryption layer

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::util::{counter_block, xor_in_place, Block};

/// A set of AES-128 keys whose encryptions are XORed together.
#[derive(Clone)]
pub(crate) struct MultiKeyAes {
    ciphers: Vec<Aes128>,
}

impl MultiKeyAes {
    pub(crate) fn new(keys: &[Block]) -> Self {
        Self {
            ciphers: keys
                .iter()
                .map(|key| Aes128::new(GenericArray::from_slice(key)))
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ciphers.len()
    }

    /// `XOR_k AES_k(input)` over every key of the set.
    pub(crate) fn encrypt_xor(&self, input: &Block) -> Block {
        let input = aes::Block::from(*input);
        let mut output = aes::Block::default();
        let mut acc = [0; 16];

        for cipher in &self.ciphers {
            cipher.encrypt_block_b2b(&input, &mut output);
            xor_in_place(&mut acc, &output);
        }

        acc
    }

    /// [`MultiKeyAes::encrypt_xor`] for many inputs, evaluated one key at a
    /// time.
    pub(crate) fn encrypt_xor_batch(&self, inputs: &[Block]) -> Vec<Block> {
        let mut acc = vec![[0; 16]; inputs.len()];
        let mut buffer: Vec<aes::Block> = Vec::with_capacity(inputs.len());

        for cipher in &self.ciphers {
            buffer.clear();
            buffer.extend(inputs.iter().map(|input| aes::Block::from(*input)));
            cipher.encrypt_blocks(&mut buffer);

            for (acc, block) in acc.iter_mut().zip(&buffer) {
                xor_in_place(acc, block);
            }
        }

        acc
    }
}

/// XORs `blocks[i]` with `AES_key(i)`, counting from zero.
pub(crate) fn apply_keystream(key: &Block, blocks: &mut [Block]) {
    let cipher = Aes128::new(GenericArray::from_slice(key));

    for (counter, block) in (0u64..).zip(blocks.iter_mut()) {
        let mut pad = aes::Block::from(counter_block(counter));
        cipher.encrypt_block(&mut pad);
        xor_in_place(block, &pad);
    }
}
