// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Combinatorial key generation

use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::MultiKeyAes;
use crate::util::Block;
use crate::{Error, Params, Result};

/// Upper bound on the number of AES keys of a [`MasterKey`].
///
/// The key count `C(n, n - m + 1)` explodes for large deployments; `n = 40`
/// with `m = 20` already asks for about 1.3e11 keys.
pub const MAX_KEYS: usize = 1 << 20;

/// The full key of the symmetric DPRF: one AES-128 key per `(n - m + 1)`-sized
/// subset of parties, held by every party of that subset.
#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MasterKey {
    keys: Vec<Block>,
    structure: Vec<Vec<usize>>,
    sub_keys: Vec<Vec<Block>>,
}

/// The key material of one party.
#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct KeyShare {
    party: usize,
    structure: Vec<Vec<usize>>,
    keys: Vec<Block>,
}

impl MasterKey {
    /// Samples `C(n, n - m + 1)` keys and deals them out.
    ///
    /// # Errors
    /// [`Error::Parameters`] if the number of keys exceeds [`MAX_KEYS`].
    pub fn generate<R: RngCore + CryptoRng>(params: Params, rng: &mut R) -> Result<Self> {
        let parties = params.parties();
        let subset_len = parties - params.threshold() + 1;
        let count = key_count(parties, subset_len)?;
        let per_party = binomial(parties - 1, subset_len - 1)?;

        let mut keys = vec![[0; 16]; count];
        for key in &mut keys {
            rng.fill_bytes(key);
        }

        let mut structure = vec![Vec::with_capacity(per_party); parties];
        let mut sub_keys = vec![Vec::with_capacity(per_party); parties];
        for (index, subset) in Subsets::new(parties, subset_len).enumerate() {
            for party in subset {
                structure[party].push(index);
                sub_keys[party].push(keys[index]);
            }
        }

        debug!(parties, threshold = params.threshold(), keys = count, "generated symmetric key");

        Ok(Self {
            keys,
            structure,
            sub_keys,
        })
    }

    /// All keys, in subset order.
    pub fn keys(&self) -> &[Block] {
        &self.keys
    }

    /// For every party, the indices of the keys it holds.
    pub fn key_structure(&self) -> &[Vec<usize>] {
        &self.structure
    }

    /// The keys held by `party`, in the order of its key structure row.
    ///
    /// # Errors
    /// [`Error::Parameters`] if `party` is out of range.
    pub fn sub_keys(&self, party: usize) -> Result<&[Block]> {
        self.sub_keys
            .get(party)
            .map(Vec::as_slice)
            .ok_or(Error::Parameters)
    }

    /// The share handed to `party`.
    ///
    /// # Errors
    /// [`Error::Parameters`] if `party` is out of range.
    pub fn share(&self, party: usize) -> Result<KeyShare> {
        Ok(KeyShare {
            party,
            structure: self.structure.clone(),
            keys: self.sub_keys(party)?.to_vec(),
        })
    }

    /// Evaluates the PRF with the full key: `XOR_k AES_k(input)` over every
    /// key.
    pub fn evaluate(&self, input: &Block) -> Block {
        MultiKeyAes::new(&self.keys).encrypt_xor(input)
    }
}

impl KeyShare {
    /// Assembles a share from its parts, such as a share loaded from storage.
    pub fn new(party: usize, structure: Vec<Vec<usize>>, keys: Vec<Block>) -> Self {
        Self {
            party,
            structure,
            keys,
        }
    }

    /// Index of the owning party.
    pub fn party(&self) -> usize {
        self.party
    }

    /// For every party, the indices of the keys it holds.
    pub fn key_structure(&self) -> &[Vec<usize>] {
        &self.structure
    }

    /// The keys of the owning party.
    pub fn keys(&self) -> &[Block] {
        &self.keys
    }
}

/// Number of keys for subsets of `subset_len` out of `parties`, bounded by
/// [`MAX_KEYS`].
pub(crate) fn key_count(parties: usize, subset_len: usize) -> Result<usize> {
    match binomial(parties, subset_len)? {
        count if count > MAX_KEYS => Err(Error::Parameters),
        count => Ok(count),
    }
}

/// `n choose k`.
pub(crate) fn binomial(n: usize, k: usize) -> Result<usize> {
    if k > n {
        return Ok(0);
    }

    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result
            .checked_mul((n - i) as u128)
            .ok_or(Error::Parameters)?
            / (i + 1) as u128;
    }

    usize::try_from(result).map_err(|_| Error::Parameters)
}

/// The `k`-sized subsets of `0..n` in lexicographic order.
pub(crate) struct Subsets {
    n: usize,
    next: Option<Vec<usize>>,
}

impl Subsets {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            next: (k <= n).then(|| (0..k).collect()),
        }
    }
}

impl Iterator for Subsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let k = current.len();

        // Bump the rightmost element that has room, then reset the tail.
        let mut successor = current.clone();
        self.next = (0..k).rev().find(|&i| successor[i] != i + self.n - k).map(|i| {
            successor[i] += 1;
            for j in i + 1..k {
                successor[j] = successor[j - 1] + 1;
            }
            successor
        });

        Some(current)
    }
}
