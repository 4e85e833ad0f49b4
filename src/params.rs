// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Party count, threshold and the scheme variants

use crate::{Error, Result};

/// Validated `(n, m)` configuration: `n` parties, any `m` of which evaluate
/// the DPRF.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawParams")
)]
pub struct Params {
    parties: usize,
    threshold: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawParams {
    parties: usize,
    threshold: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawParams> for Params {
    type Error = Error;

    fn try_from(raw: RawParams) -> Result<Self> {
        Self::new(raw.parties, raw.threshold)
    }
}

impl Params {
    /// Creates the configuration for `parties` parties with threshold
    /// `threshold`.
    ///
    /// # Errors
    /// [`Error::Parameters`] unless `1 <= threshold <= parties`.
    pub fn new(parties: usize, threshold: usize) -> Result<Self> {
        if threshold == 0 || threshold > parties {
            return Err(Error::Parameters);
        }

        Ok(Self { parties, threshold })
    }

    /// Total number of parties `n`.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of parties `m` that evaluate together.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub(crate) fn check_party(&self, party: usize) -> Result<()> {
        if party < self.parties {
            Ok(())
        } else {
            Err(Error::Parameters)
        }
    }

    /// The canonical threshold set of `party`: `party, party + 1, ...,
    /// party + m - 1`, modulo `n`.
    pub fn canonical_set(&self, party: usize) -> impl Iterator<Item = usize> {
        let parties = self.parties;
        (party..party + self.threshold).map(move |index| index % parties)
    }

    /// Position of `peer` in the channel vectors of `party`, which skip
    /// `party` itself.
    pub(crate) fn slot(&self, party: usize, peer: usize) -> Result<usize> {
        if peer == party || peer >= self.parties {
            return Err(Error::Parameters);
        }

        Ok(if peer < party { peer } else { peer - 1 })
    }

    /// Inverse of [`Params::slot`].
    pub(crate) fn peer(party: usize, slot: usize) -> usize {
        if slot < party {
            slot
        } else {
            slot + 1
        }
    }
}

/// Proof layer of the asymmetric scheme.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Peers are trusted to compute their shares honestly.
    SemiHonest,
    /// Every share carries a Chaum-Pedersen proof against a public
    /// commitment.
    Malicious,
    /// Shares verifiable by third parties. Not implemented.
    PubliclyVerifiable,
}

/// The DPRF constructions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// Combinatorial secret sharing over AES-128.
    Symmetric,
    /// Shamir secret sharing in the exponent of a prime-order group.
    Asymmetric(Mode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert_eq!(Params::new(4, 0), Err(Error::Parameters));
        assert_eq!(Params::new(4, 5), Err(Error::Parameters));
        assert_eq!(Params::new(0, 0), Err(Error::Parameters));

        let params = Params::new(4, 2).unwrap();
        assert_eq!(params.parties(), 4);
        assert_eq!(params.threshold(), 2);
        assert!(params.check_party(3).is_ok());
        assert_eq!(params.check_party(4), Err(Error::Parameters));
    }

    #[test]
    fn test_canonical_set_wraps() {
        let params = Params::new(5, 3).unwrap();

        assert_eq!(params.canonical_set(0).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(params.canonical_set(3).collect::<Vec<_>>(), [3, 4, 0]);
        assert_eq!(params.canonical_set(4).collect::<Vec<_>>(), [4, 0, 1]);
    }

    #[test]
    fn test_slots() {
        let params = Params::new(4, 2).unwrap();

        assert_eq!(params.slot(2, 0), Ok(0));
        assert_eq!(params.slot(2, 1), Ok(1));
        assert_eq!(params.slot(2, 3), Ok(2));
        assert_eq!(params.slot(2, 2), Err(Error::Parameters));
        assert_eq!(params.slot(2, 4), Err(Error::Parameters));

        for party in 0..4 {
            for slot in 0..3 {
                assert_eq!(params.slot(party, Params::peer(party, slot)), Ok(slot));
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_params_serde_revalidates() {
        let params: Params = serde_json::from_str(r#"{"parties":3,"threshold":2}"#).unwrap();
        assert_eq!(params, Params::new(3, 2).unwrap());
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"parties":3,"threshold":2}"#);

        assert!(serde_json::from_str::<Params>(r#"{"parties":3,"threshold":4}"#).is_err());
    }
}
