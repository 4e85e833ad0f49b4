// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Errors which are produced during an execution of the protocol

use displaydoc::Display;

/// [`Result`](core::result::Result) shorthand that uses [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Represents an error raised while evaluating or serving the DPRF
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    /// Request size is not a multiple of the 16-byte input block.
    MalformedRequest,
    /// A peer answered with a response of unexpected size.
    MalformedResponse,
    /// Party {party} is not allowed to request shares from this party.
    UnexpectedRequester {
        /// Index of the offending requester.
        party: usize,
    },
    /// In malicious mode, occurs when a peer's proof failed to verify
    ProofVerification,
    /// The publicly verifiable mode is not implemented.
    UnimplementedVariant,
    /// Party count, threshold, party index or key layout are inconsistent.
    Parameters,
    /// Malicious mode needs one commitment per party.
    Commitments,
    /// Batched evaluation was called without any input.
    Batch,
    /// The party was closed and no longer issues requests.
    Closed,
    /// A channel to a peer was closed before the exchange completed.
    ChannelClosed,
    /// Input is empty or could not be hashed.
    Input,
    /// Failure to deserialize bytes
    Deserialization,
    /// Ciphertext is shorter than the minimum of four blocks.
    CiphertextTooShort,
    /// Decrypted message does not match its commitment.
    Integrity,
}

/// Only used to implement [`Group`](crate::Group).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum InternalError {
    /// `expand_message` rejected the input or domain separation tag.
    Input,
}

impl From<InternalError> for Error {
    fn from(error: InternalError) -> Self {
        match error {
            InternalError::Input => Error::Input,
        }
    }
}

impl core::error::Error for Error {}

impl core::error::Error for InternalError {}
