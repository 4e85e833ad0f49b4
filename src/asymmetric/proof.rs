// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Chaum-Pedersen proof that a share `Y = V * k` uses the same exponent as the
//! commitment `C = G * k`

use generic_array::typenum::Unsigned;
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{Error, Group, Result};

pub(crate) struct Proof<G: Group> {
    a1: G::Elem,
    a2: G::Elem,
    z: G::Scalar,
}

impl<G: Group> Proof<G> {
    /// Size of the serialized proof.
    pub(crate) const LEN: usize = 2 * G::ElemLen::USIZE + G::ScalarLen::USIZE;

    /// Proves knowledge of `key` with `point * key` and `G * key` for
    /// `challenge`.
    pub(crate) fn generate<R: RngCore + CryptoRng>(
        rng: &mut R,
        key: G::Scalar,
        point: G::Elem,
        challenge: G::Scalar,
    ) -> Self {
        let mut r = G::random_scalar(rng);
        let proof = Self {
            a1: G::base_elem() * &r,
            a2: point * &r,
            z: r + &(key * &challenge),
        };
        r.zeroize();

        proof
    }

    /// Checks `G * z == a1 + commitment * c` and `point * z == a2 + share * c`.
    ///
    /// # Errors
    /// [`Error::ProofVerification`] if either equation fails.
    pub(crate) fn verify(
        &self,
        commitment: G::Elem,
        point: G::Elem,
        share: G::Elem,
        challenge: G::Scalar,
    ) -> Result<()> {
        let commitment_check =
            (G::base_elem() * &self.z).ct_eq(&(self.a1 + &(commitment * &challenge)));
        let share_check = (point * &self.z).ct_eq(&(self.a2 + &(share * &challenge)));

        if bool::from(commitment_check & share_check) {
            Ok(())
        } else {
            Err(Error::ProofVerification)
        }
    }

    pub(crate) fn serialize_into(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&G::serialize_elem(self.a1));
        output.extend_from_slice(&G::serialize_elem(self.a2));
        output.extend_from_slice(&G::serialize_scalar(self.z));
    }

    /// # Errors
    /// [`Error::Deserialization`] if the bytes are not a valid proof.
    pub(crate) fn deserialize(input: &[u8]) -> Result<Self> {
        let elem_len = G::ElemLen::USIZE;
        if input.len() != Self::LEN {
            return Err(Error::Deserialization);
        }

        Ok(Self {
            a1: G::deserialize_elem(&input[..elem_len])?,
            a2: G::deserialize_elem(&input[elem_len..2 * elem_len])?,
            z: G::deserialize_scalar(&input[2 * elem_len..])?,
        })
    }
}
