// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The operations shared by every DPRF variant

use core::future::Future;

use futures::executor::block_on;

use crate::asymmetric::{AsymDprf, AsymPending};
use crate::net::Sender;
use crate::symmetric::{SymDprf, SymPending};
use crate::util::Block;
use crate::{CipherSuite, Error, Lifecycle, Params, Result, Variant};

/// An evaluation whose requests were sent but whose result was not combined
/// yet.
///
/// Completing consumes the handle, so every evaluation is combined at most
/// once.
pub trait Completion: Send + Sized {
    /// Waits for the responses of every peer and combines them with the local
    /// contribution. Outputs are in input order.
    ///
    /// # Errors
    /// - [`Error::ChannelClosed`] if a peer went away before answering.
    /// - [`Error::MalformedResponse`] if a peer rejected the request or sent
    ///   a response of the wrong size.
    /// - [`Error::Deserialization`] if a share or proof can't be decoded.
    /// - [`Error::ProofVerification`] if a proof failed to verify.
    fn finish(self) -> impl Future<Output = Result<Vec<Block>>> + Send;

    /// Blocking version of [`Completion::finish`].
    ///
    /// Must not be called from inside an asynchronous task; the listener tasks
    /// of the runtime have to make progress while this blocks.
    ///
    /// # Errors
    /// See [`Completion::finish`].
    fn wait(self) -> Result<Vec<Block>> {
        block_on(self.finish())
    }
}

/// A party of a distributed PRF.
pub trait Dprf {
    /// Completion handle returned by the asynchronous evaluations.
    type Pending: Completion;

    /// The construction this party runs.
    fn variant(&self) -> Variant;

    /// Index of this party.
    fn party(&self) -> usize;

    /// Party count and threshold.
    fn params(&self) -> Params;

    /// Current lifecycle state.
    fn lifecycle(&self) -> Lifecycle;

    /// Computes the shares for the 16-byte units of `request` and sends them
    /// to `reply_to`.
    ///
    /// # Errors
    /// - [`Error::MalformedRequest`] if the request is not a multiple of 16
    ///   bytes.
    /// - [`Error::UnexpectedRequester`] if this party holds no keys for
    ///   `reply_to`, i.e. is not part of its canonical set (symmetric scheme
    ///   only).
    /// - [`Error::Parameters`] if `reply_to` is not a peer.
    fn serve_one(&mut self, request: &[u8], reply_to: usize) -> Result<()>;

    /// Evaluates the DPRF on `input`, blocking until every peer answered.
    ///
    /// # Errors
    /// See [`Dprf::async_eval`] and [`Completion::finish`].
    fn eval(&mut self, input: Block) -> Result<Block> {
        self.async_eval(input)?
            .wait()?
            .pop()
            .ok_or(Error::MalformedResponse)
    }

    /// Starts evaluating the DPRF on `input`.
    ///
    /// # Errors
    /// See [`Dprf::async_eval_batch`].
    fn async_eval(&mut self, input: Block) -> Result<Self::Pending> {
        self.async_eval_batch(&[input])
    }

    /// Sends one request covering every input to the other parties of the
    /// canonical set and computes the local contribution.
    ///
    /// # Errors
    /// - [`Error::Batch`] if `inputs` is empty.
    /// - [`Error::Closed`] if the party was closed.
    /// - [`Error::ChannelClosed`] if a request could not be sent.
    fn async_eval_batch(&mut self, inputs: &[Block]) -> Result<Self::Pending>;

    /// Tells every peer that this party stops issuing requests. Calling it
    /// again has no effect.
    fn close(&mut self);

    /// Closes the party and waits until every peer closed, so that no serving
    /// work outlives the party.
    ///
    /// # Errors
    /// [`Error::ChannelClosed`] if the drain task went away.
    fn shutdown(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// Any DPRF variant, chosen at runtime.
pub enum AnyDprf<CS: CipherSuite, S: Sender> {
    /// The combinatorial construction.
    Symmetric(SymDprf<S>),
    /// The Shamir construction, in any of its modes.
    Asymmetric(AsymDprf<CS, S>),
}

/// Completion handle of [`AnyDprf`].
pub enum AnyPending<CS: CipherSuite> {
    /// Pending symmetric evaluation.
    Symmetric(SymPending),
    /// Pending asymmetric evaluation.
    Asymmetric(AsymPending<CS>),
}

impl<CS: CipherSuite> Completion for AnyPending<CS> {
    fn finish(self) -> impl Future<Output = Result<Vec<Block>>> + Send {
        async move {
            match self {
                Self::Symmetric(pending) => pending.finish().await,
                Self::Asymmetric(pending) => pending.finish().await,
            }
        }
    }
}

impl<CS: CipherSuite, S: Sender> From<SymDprf<S>> for AnyDprf<CS, S> {
    fn from(dprf: SymDprf<S>) -> Self {
        Self::Symmetric(dprf)
    }
}

impl<CS: CipherSuite, S: Sender> From<AsymDprf<CS, S>> for AnyDprf<CS, S> {
    fn from(dprf: AsymDprf<CS, S>) -> Self {
        Self::Asymmetric(dprf)
    }
}

impl<CS: CipherSuite, S: Sender> Dprf for AnyDprf<CS, S> {
    type Pending = AnyPending<CS>;

    fn variant(&self) -> Variant {
        match self {
            Self::Symmetric(dprf) => dprf.variant(),
            Self::Asymmetric(dprf) => dprf.variant(),
        }
    }

    fn party(&self) -> usize {
        match self {
            Self::Symmetric(dprf) => dprf.party(),
            Self::Asymmetric(dprf) => dprf.party(),
        }
    }

    fn params(&self) -> Params {
        match self {
            Self::Symmetric(dprf) => dprf.params(),
            Self::Asymmetric(dprf) => dprf.params(),
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        match self {
            Self::Symmetric(dprf) => dprf.lifecycle(),
            Self::Asymmetric(dprf) => dprf.lifecycle(),
        }
    }

    fn serve_one(&mut self, request: &[u8], reply_to: usize) -> Result<()> {
        match self {
            Self::Symmetric(dprf) => dprf.serve_one(request, reply_to),
            Self::Asymmetric(dprf) => dprf.serve_one(request, reply_to),
        }
    }

    fn async_eval_batch(&mut self, inputs: &[Block]) -> Result<Self::Pending> {
        match self {
            Self::Symmetric(dprf) => dprf.async_eval_batch(inputs).map(AnyPending::Symmetric),
            Self::Asymmetric(dprf) => dprf.async_eval_batch(inputs).map(AnyPending::Asymmetric),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Symmetric(dprf) => dprf.close(),
            Self::Asymmetric(dprf) => dprf.close(),
        }
    }

    fn shutdown(self) -> impl Future<Output = Result<()>> + Send {
        async move {
            match self {
                Self::Symmetric(dprf) => dprf.shutdown().await,
                Self::Asymmetric(dprf) => dprf.shutdown().await,
            }
        }
    }
}
