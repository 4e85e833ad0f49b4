// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! An implementation of threshold distributed pseudorandom functions (DPRF)
//! following Naor, Pinkas and Reingold
//!
//! The key of a DPRF is shared among `n` parties such that any `m` of them
//! can evaluate it on a 16-byte input, while fewer learn nothing about it.
//! Every party is both a server, answering share requests from its peers on
//! background tasks, and a client, combining the shares of the `m - 1` peers
//! following it (modulo `n`) with its own.
//!
//! Two constructions are provided:
//! - [`symmetric`]: one AES-128 key per subset of `n - m + 1` parties. Fast,
//!   but the key count grows as `C(n, m - 1)` and wrong shares go unnoticed.
//! - [`asymmetric`]: Shamir secret sharing in the exponent of a prime-order
//!   group. In [`Mode::Malicious`] every share is proven correct against a
//!   public commitment.
//!
//! [`encryption::Client`] builds threshold symmetric encryption on top of
//! either of them.
//!
//! # Example
//!
//! ```
//! use dprf::net::mem;
//! use dprf::symmetric::{MasterKey, SymDprf};
//! use dprf::{Dprf, Params};
//! use rand::rngs::OsRng;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let params = Params::new(3, 2)?;
//! let key = MasterKey::generate(params, &mut OsRng)?;
//!
//! let mut parties = mem::connect(3)
//!     .into_iter()
//!     .enumerate()
//!     .map(|(party, links)| {
//!         SymDprf::new(runtime.handle(), params, &key.share(party)?, links, [party as u8; 32])
//!     })
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let input = [7; 16];
//! let output = parties[0].eval(input)?;
//! assert_eq!(output, parties[2].eval(input)?);
//! assert_eq!(output, key.evaluate(&input));
//!
//! for party in &mut parties {
//!     party.close();
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `ristretto255` enables [`Ristretto255`] as a [`Group`], and
//!   `ristretto255-ciphersuite` (the default) as a [`CipherSuite`] with
//!   SHA-512.
//! - `serde` implements serialization for [`Params`], [`Mode`], [`Variant`]
//!   and the symmetric key material.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod asymmetric;
mod cipher;
mod ciphersuite;
mod dprf;
pub mod encryption;
mod endpoint;
mod error;
pub mod group;
pub mod net;
mod params;
pub mod symmetric;
mod util;

#[cfg(test)]
mod tests;

pub use crate::asymmetric::AsymDprf;
pub use crate::ciphersuite::CipherSuite;
pub use crate::dprf::{AnyDprf, AnyPending, Completion, Dprf};
pub use crate::endpoint::Lifecycle;
pub use crate::error::{Error, InternalError, Result};
#[cfg(feature = "ristretto255")]
pub use crate::group::Ristretto255;
pub use crate::group::Group;
pub use crate::params::{Mode, Params, Variant};
pub use crate::symmetric::SymDprf;
pub use crate::util::{Block, BLOCK_LEN};
