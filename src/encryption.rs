// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Threshold symmetric encryption on top of a [`Dprf`]
//!
//! A message `m` is committed to with a random `rho` as
//! `alpha = H(m || rho)`. The DPRF value at `alpha` keys AES in counter mode,
//! which encrypts `rho` under counter 0 and the message blocks under the
//! following counters. A ciphertext is laid out as
//!
//! ```text
//! | party | alpha | rho ^ E(0) | m_0 ^ E(1) | ... | m_l ^ E(l + 1) |
//! ```
//!
//! Decryption evaluates the DPRF at `alpha` again, strips the keystream and
//! recomputes the commitment, so any party of the threshold group can decrypt
//! what any other encrypted while tampering is detected.

use core::future::Future;

use futures::executor::block_on;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::cipher::apply_keystream;
use crate::util::{concat_blocks, random_oracle, Block, BLOCK_LEN};
use crate::{Completion, Dprf, Error, Result};

/// Blocks preceding the message in a ciphertext.
const HEADER_BLOCKS: usize = 3;

/// Encrypts and decrypts with the DPRF of one party.
pub struct Client<D: Dprf> {
    dprf: D,
    rng: ChaCha20Rng,
}

fn commit(plaintext: &[Block], rho: &Block) -> Block {
    random_oracle::<Sha256>(&[&concat_blocks(plaintext), rho])
}

fn party_block(party: usize) -> Block {
    (party as u128).to_le_bytes()
}

impl<D: Dprf> Client<D> {
    /// Wraps `dprf`; `seed` seeds the commitment randomness.
    pub fn new(dprf: D, seed: [u8; 32]) -> Self {
        Self {
            dprf,
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// The underlying DPRF party.
    pub fn dprf(&self) -> &D {
        &self.dprf
    }

    /// Mutable access to the underlying DPRF party, e.g. to serve requests.
    pub fn dprf_mut(&mut self) -> &mut D {
        &mut self.dprf
    }

    /// Returns the underlying DPRF party.
    pub fn into_inner(self) -> D {
        self.dprf
    }

    /// Closes the underlying DPRF party.
    pub fn close(&mut self) {
        self.dprf.close();
    }

    /// Encrypts `plaintext`, blocking until the DPRF evaluation completes.
    ///
    /// # Errors
    /// - [`Error::Input`] if `plaintext` is empty.
    /// - Any error of the DPRF evaluation.
    pub fn encrypt(&mut self, plaintext: &[Block]) -> Result<Vec<Block>> {
        self.async_encrypt(plaintext)?.wait()
    }

    /// Decrypts `ciphertext`, blocking until the DPRF evaluation completes.
    ///
    /// # Errors
    /// - [`Error::CiphertextTooShort`] if `ciphertext` has fewer than four
    ///   blocks.
    /// - [`Error::Integrity`] if the ciphertext was tampered with.
    /// - Any error of the DPRF evaluation.
    pub fn decrypt(&mut self, ciphertext: &[Block]) -> Result<Vec<Block>> {
        self.async_decrypt(ciphertext)?.wait()
    }

    /// Starts encrypting `plaintext`.
    ///
    /// # Errors
    /// See [`Client::encrypt`].
    pub fn async_encrypt(&mut self, plaintext: &[Block]) -> Result<PendingOne<D::Pending>> {
        self.async_encrypt_batch(&[plaintext]).map(PendingOne)
    }

    /// Starts decrypting `ciphertext`.
    ///
    /// # Errors
    /// See [`Client::decrypt`].
    pub fn async_decrypt(&mut self, ciphertext: &[Block]) -> Result<PendingOne<D::Pending>> {
        self.async_decrypt_batch(&[ciphertext]).map(PendingOne)
    }

    /// Starts encrypting every plaintext with a single DPRF round.
    ///
    /// # Errors
    /// - [`Error::Batch`] if `plaintexts` is empty.
    /// - [`Error::Input`] if one of the plaintexts is empty.
    /// - Any error of the DPRF evaluation.
    pub fn async_encrypt_batch<T: AsRef<[Block]>>(
        &mut self,
        plaintexts: &[T],
    ) -> Result<Pending<D::Pending>> {
        let party = party_block(self.dprf.party());
        let mut alphas = Vec::with_capacity(plaintexts.len());
        let mut texts = Vec::with_capacity(plaintexts.len());

        for plaintext in plaintexts {
            let plaintext = plaintext.as_ref();
            if plaintext.is_empty() {
                return Err(Error::Input);
            }

            let mut rho = [0; BLOCK_LEN];
            self.rng.fill_bytes(&mut rho);
            let alpha = commit(plaintext, &rho);

            let mut ciphertext = Vec::with_capacity(HEADER_BLOCKS + plaintext.len());
            ciphertext.extend_from_slice(&[party, alpha, rho]);
            ciphertext.extend_from_slice(plaintext);

            alphas.push(alpha);
            texts.push(ciphertext);
        }

        let evaluation = self.dprf.async_eval_batch(&alphas)?;
        debug!(party = self.dprf.party(), messages = texts.len(), "issued encryption");

        Ok(Pending {
            direction: Direction::Encrypt,
            evaluation,
            alphas,
            texts,
        })
    }

    /// Starts decrypting every ciphertext with a single DPRF round.
    ///
    /// # Errors
    /// - [`Error::Batch`] if `ciphertexts` is empty.
    /// - [`Error::CiphertextTooShort`] if one of the ciphertexts has fewer
    ///   than four blocks.
    /// - Any error of the DPRF evaluation.
    pub fn async_decrypt_batch<T: AsRef<[Block]>>(
        &mut self,
        ciphertexts: &[T],
    ) -> Result<Pending<D::Pending>> {
        let mut alphas = Vec::with_capacity(ciphertexts.len());
        let mut texts = Vec::with_capacity(ciphertexts.len());

        for ciphertext in ciphertexts {
            let ciphertext = ciphertext.as_ref();
            if ciphertext.len() <= HEADER_BLOCKS {
                return Err(Error::CiphertextTooShort);
            }

            alphas.push(ciphertext[1]);
            texts.push(ciphertext[HEADER_BLOCKS - 1..].to_vec());
        }

        let evaluation = self.dprf.async_eval_batch(&alphas)?;
        debug!(party = self.dprf.party(), messages = texts.len(), "issued decryption");

        Ok(Pending {
            direction: Direction::Decrypt,
            evaluation,
            alphas,
            texts,
        })
    }
}

enum Direction {
    Encrypt,
    Decrypt,
}

/// A batch of encryptions or decryptions waiting for its DPRF evaluation.
#[must_use = "the result is only available through `finish` or `wait`"]
pub struct Pending<P: Completion> {
    direction: Direction,
    evaluation: P,
    alphas: Vec<Block>,
    /// Ciphertexts with `rho` and the plaintext in the clear when encrypting,
    /// ciphertexts without their first two blocks when decrypting.
    texts: Vec<Vec<Block>>,
}

impl<P: Completion> Pending<P> {
    /// Completes the DPRF evaluation and applies the keystreams. Results are
    /// in the order of the batch.
    ///
    /// # Errors
    /// - [`Error::Integrity`] if a ciphertext was tampered with; the whole
    ///   batch fails.
    /// - Any error of [`Completion::finish`].
    pub fn finish(self) -> impl Future<Output = Result<Vec<Vec<Block>>>> + Send {
        async move {
            let keys = self.evaluation.finish().await?;
            if keys.len() != self.texts.len() {
                return Err(Error::MalformedResponse);
            }

            match self.direction {
                Direction::Encrypt => Ok(self
                    .texts
                    .into_iter()
                    .zip(&keys)
                    .map(|(mut ciphertext, key)| {
                        apply_keystream(key, &mut ciphertext[HEADER_BLOCKS - 1..]);
                        ciphertext
                    })
                    .collect()),
                Direction::Decrypt => self
                    .texts
                    .into_iter()
                    .zip(&keys)
                    .zip(&self.alphas)
                    .map(|((mut body, key), alpha)| {
                        apply_keystream(key, &mut body);
                        let plaintext = body.split_off(1);
                        let expected = commit(&plaintext, &body[0]);

                        if bool::from(alpha[..].ct_eq(&expected[..])) {
                            Ok(plaintext)
                        } else {
                            warn!("ciphertext failed the integrity check");
                            Err(Error::Integrity)
                        }
                    })
                    .collect(),
            }
        }
    }

    /// Blocking version of [`Pending::finish`].
    ///
    /// # Errors
    /// See [`Pending::finish`].
    pub fn wait(self) -> Result<Vec<Vec<Block>>> {
        block_on(self.finish())
    }
}

/// A single encryption or decryption waiting for its DPRF evaluation.
#[must_use = "the result is only available through `finish` or `wait`"]
pub struct PendingOne<P: Completion>(Pending<P>);

impl<P: Completion> PendingOne<P> {
    /// Completes the operation.
    ///
    /// # Errors
    /// See [`Pending::finish`].
    pub fn finish(self) -> impl Future<Output = Result<Vec<Block>>> + Send {
        async move { self.0.finish().await?.pop().ok_or(Error::MalformedResponse) }
    }

    /// Blocking version of [`PendingOne::finish`].
    ///
    /// # Errors
    /// See [`Pending::finish`].
    pub fn wait(self) -> Result<Vec<Block>> {
        block_on(self.finish())
    }
}
