// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Shamir key generation and interpolation

use derive_where::derive_where;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroize;

use super::{finalize, hash_to_group};
use crate::util::Block;
use crate::{CipherSuite, Error, Group, Mode, Params, Result};

/// The secret polynomial of the asymmetric DPRF, evaluated at zero and at
/// every party index.
#[derive_where(Clone, ZeroizeOnDrop)]
#[derive_where(Debug; <CS::Group as Group>::Scalar, <CS::Group as Group>::Elem)]
pub struct MasterKey<CS: CipherSuite> {
    secret: <CS::Group as Group>::Scalar,
    shares: Vec<<CS::Group as Group>::Scalar>,
    commitments: Vec<<CS::Group as Group>::Elem>,
}

/// The key material of one party: its share and, in malicious mode, the
/// commitments to every share.
#[derive_where(Clone, ZeroizeOnDrop)]
#[derive_where(Debug; <CS::Group as Group>::Scalar, <CS::Group as Group>::Elem)]
pub struct KeyShare<CS: CipherSuite> {
    party: usize,
    secret: <CS::Group as Group>::Scalar,
    commitments: Vec<<CS::Group as Group>::Elem>,
}

impl<CS: CipherSuite> MasterKey<CS> {
    /// Samples a random polynomial of degree `m - 1` and evaluates it at
    /// `1..=n`. Commitments are only computed in [`Mode::Malicious`].
    ///
    /// # Errors
    /// [`Error::UnimplementedVariant`] for [`Mode::PubliclyVerifiable`].
    pub fn generate<R: RngCore + CryptoRng>(
        params: Params,
        mode: Mode,
        rng: &mut R,
    ) -> Result<Self> {
        if mode == Mode::PubliclyVerifiable {
            return Err(Error::UnimplementedVariant);
        }

        let mut coefficients: Vec<_> = (0..params.threshold())
            .map(|_| CS::Group::random_scalar(rng))
            .collect();
        let secret = coefficients[0];
        let shares: Vec<_> = (1..=params.parties() as u64)
            .map(|x| evaluate_polynomial::<CS::Group>(&coefficients, CS::Group::scalar_from_u64(x)))
            .collect();
        coefficients.zeroize();

        let commitments = match mode {
            Mode::Malicious => shares
                .iter()
                .map(|share| CS::Group::base_elem() * share)
                .collect(),
            _ => Vec::new(),
        };

        debug!(
            parties = params.parties(),
            threshold = params.threshold(),
            ?mode,
            "generated asymmetric key"
        );

        Ok(Self {
            secret,
            shares,
            commitments,
        })
    }

    /// The polynomial at zero.
    pub fn secret(&self) -> <CS::Group as Group>::Scalar {
        self.secret
    }

    /// `G * share` for every party; empty unless generated in malicious mode.
    pub fn commitments(&self) -> &[<CS::Group as Group>::Elem] {
        &self.commitments
    }

    /// The share handed to `party`.
    ///
    /// # Errors
    /// [`Error::Parameters`] if `party` is out of range.
    pub fn share(&self, party: usize) -> Result<KeyShare<CS>> {
        let secret = *self.shares.get(party).ok_or(Error::Parameters)?;

        Ok(KeyShare {
            party,
            secret,
            commitments: self.commitments.clone(),
        })
    }

    /// Evaluates the PRF with the full secret.
    ///
    /// # Errors
    /// [`Error::Input`] if hashing to the group fails.
    pub fn evaluate(&self, input: &Block) -> Result<Block> {
        Ok(finalize::<CS>(hash_to_group::<CS>(input)? * &self.secret))
    }
}

impl<CS: CipherSuite> KeyShare<CS> {
    /// Assembles a share from its parts, such as a share loaded from storage.
    pub fn new(
        party: usize,
        secret: <CS::Group as Group>::Scalar,
        commitments: Vec<<CS::Group as Group>::Elem>,
    ) -> Self {
        Self {
            party,
            secret,
            commitments,
        }
    }

    /// Index of the owning party.
    pub fn party(&self) -> usize {
        self.party
    }

    /// The polynomial at `party + 1`.
    pub fn secret(&self) -> <CS::Group as Group>::Scalar {
        self.secret
    }

    /// `G * share` for every party.
    pub fn commitments(&self) -> &[<CS::Group as Group>::Elem] {
        &self.commitments
    }
}

// Horner's rule
fn evaluate_polynomial<G: Group>(coefficients: &[G::Scalar], x: G::Scalar) -> G::Scalar {
    coefficients
        .iter()
        .rev()
        .fold(G::zero_scalar(), |acc, coefficient| acc * &x + coefficient)
}

/// Lagrange coefficients that interpolate a polynomial at zero from its
/// values at `points`: `l_i = prod_{j != i} x_j / (x_j - x_i)`.
///
/// The points must be distinct.
pub(crate) fn lagrange_at_zero<G: Group>(points: &[G::Scalar]) -> Vec<G::Scalar> {
    points
        .iter()
        .enumerate()
        .map(|(i, x_i)| {
            points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(G::scalar_from_u64(1), |acc, (_, x_j)| {
                    acc * x_j * &G::invert_scalar(*x_j - x_i)
                })
        })
        .collect()
}

/// The interpolation points of `parties`: party `i` holds the polynomial at
/// `i + 1`.
pub(crate) fn party_points<G: Group>(parties: impl IntoIterator<Item = usize>) -> Vec<G::Scalar> {
    parties
        .into_iter()
        .map(|party| G::scalar_from_u64(party as u64 + 1))
        .collect()
}
