// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The asymmetric DPRF: Shamir secret sharing in the exponent
//!
//! The key is the value at zero of a random polynomial of degree `m - 1`;
//! party `i` holds its value at `i + 1`. A party answers an input `x` with
//! `H(x) * share` and the requester interpolates the shares of its canonical
//! set in the exponent before hashing the result into the output block. In
//! [`Mode::Malicious`] every share is accompanied by a Chaum-Pedersen proof
//! against the public commitment of its sender.

mod key;
mod proof;

use core::future::Future;
use std::sync::Arc;

use generic_array::typenum::Unsigned;
use rand_chacha::ChaCha20Rng;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use zeroize::Zeroize;

pub use self::key::{KeyShare, MasterKey};
use self::key::{lagrange_at_zero, party_points};
use self::proof::Proof;
use crate::endpoint::{Endpoint, Reply, Server};
use crate::net::{Links, Receiver, Sender};
use crate::util::{
    concat_blocks, random_oracle, split_blocks, xor, Block, BLOCK_LEN, STR_CHALLENGE,
    STR_FINALIZE, STR_HASH_TO_GROUP,
};
use crate::{
    CipherSuite, Completion, Dprf, Error, Group, Lifecycle, Mode, Params, Result, Variant,
};

/// `V = H(input)`.
pub(crate) fn hash_to_group<CS: CipherSuite>(input: &Block) -> Result<<CS::Group as Group>::Elem> {
    CS::Group::hash_to_curve::<CS::ExpandMsg>(
        &[input.as_slice()],
        &[STR_HASH_TO_GROUP, CS::ID.as_bytes()],
    )
    .map_err(Error::from)
}

/// Proof challenge for `input`, hashed from its complement under its own tag.
fn challenge<CS: CipherSuite>(input: &Block) -> Result<<CS::Group as Group>::Scalar> {
    let complement = xor(input, &[0xff; BLOCK_LEN]);
    CS::Group::hash_to_scalar::<CS::ExpandMsg>(
        &[complement.as_slice()],
        &[STR_CHALLENGE, CS::ID.as_bytes()],
    )
    .map_err(Error::from)
}

/// Strips the algebraic structure off a combined share.
pub(crate) fn finalize<CS: CipherSuite>(elem: <CS::Group as Group>::Elem) -> Block {
    let elem_len = <CS::Group as Group>::ElemLen::U16.to_be_bytes();
    let serialized = CS::Group::serialize_elem(elem);

    random_oracle::<CS::Hash>(&[&elem_len, &serialized, STR_FINALIZE])
}

/// Size of the response to one input.
fn response_len<CS: CipherSuite>(mode: Mode) -> usize {
    let share_len = <CS::Group as Group>::ElemLen::USIZE;
    match mode {
        Mode::Malicious => share_len + Proof::<CS::Group>::LEN,
        _ => share_len,
    }
}

pub(crate) struct AsymServer<CS: CipherSuite> {
    key: <CS::Group as Group>::Scalar,
    mode: Mode,
}

impl<CS: CipherSuite> AsymServer<CS> {
    fn serve_unit(&self, input: &Block, rng: &mut ChaCha20Rng, response: &mut Vec<u8>) -> Result<()> {
        let point = hash_to_group::<CS>(input)?;
        response.extend_from_slice(&CS::Group::serialize_elem(point * &self.key));

        if self.mode == Mode::Malicious {
            let challenge = challenge::<CS>(input)?;
            Proof::<CS::Group>::generate(rng, self.key, point, challenge).serialize_into(response);
        }

        Ok(())
    }
}

impl<CS: CipherSuite> Server for AsymServer<CS> {
    fn serve(&self, request: &[u8], _: usize, rng: &mut ChaCha20Rng) -> Result<Vec<u8>> {
        let inputs = split_blocks(request)?;
        let mut response = Vec::with_capacity(inputs.len() * response_len::<CS>(self.mode));
        for input in &inputs {
            self.serve_unit(input, rng, &mut response)?;
        }

        Ok(response)
    }
}

impl<CS: CipherSuite> Drop for AsymServer<CS> {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Data the requester needs to combine shares, fixed at initialization.
struct Combiner<CS: CipherSuite> {
    mode: Mode,
    /// Coefficient of every member of the canonical set, own one first.
    lagrange: Vec<<CS::Group as Group>::Scalar>,
    commitments: Vec<<CS::Group as Group>::Elem>,
}

/// A party of the asymmetric DPRF.
pub struct AsymDprf<CS: CipherSuite, S: Sender> {
    server: Arc<AsymServer<CS>>,
    combiner: Arc<Combiner<CS>>,
    endpoint: Endpoint<S>,
}

impl<CS: CipherSuite, S: Sender> AsymDprf<CS, S> {
    /// Starts the party holding `share` in `mode`, connected to its peers
    /// through `links`. Listener tasks are spawned on `runtime`; `seed` seeds
    /// the party's randomness, including its proofs.
    ///
    /// # Errors
    /// - [`Error::UnimplementedVariant`] for [`Mode::PubliclyVerifiable`].
    /// - [`Error::Commitments`] if malicious mode lacks one commitment per
    ///   party.
    /// - [`Error::Parameters`] if the share or `links` don't match `params`.
    pub fn new<R: Receiver>(
        runtime: &Handle,
        params: Params,
        mode: Mode,
        share: &KeyShare<CS>,
        links: Links<S, R>,
        seed: [u8; 32],
    ) -> Result<Self> {
        if mode == Mode::PubliclyVerifiable {
            return Err(Error::UnimplementedVariant);
        }
        let party = share.party();
        params.check_party(party)?;

        let commitments = match mode {
            Mode::Malicious if share.commitments().len() != params.parties() => {
                return Err(Error::Commitments)
            }
            Mode::Malicious => share.commitments().to_vec(),
            _ => Vec::new(),
        };
        let lagrange = lagrange_at_zero::<CS::Group>(&party_points::<CS::Group>(
            params.canonical_set(party),
        ));

        let server = Arc::new(AsymServer {
            key: share.secret(),
            mode,
        });
        let endpoint = Endpoint::start(runtime, params, party, links, Arc::clone(&server), seed)?;

        Ok(Self {
            server,
            combiner: Arc::new(Combiner {
                mode,
                lagrange,
                commitments,
            }),
            endpoint,
        })
    }
}

impl<CS: CipherSuite, S: Sender> Dprf for AsymDprf<CS, S> {
    type Pending = AsymPending<CS>;

    fn variant(&self) -> Variant {
        Variant::Asymmetric(self.server.mode)
    }

    fn party(&self) -> usize {
        self.endpoint.party()
    }

    fn params(&self) -> Params {
        self.endpoint.params()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.endpoint.lifecycle()
    }

    fn serve_one(&mut self, request: &[u8], reply_to: usize) -> Result<()> {
        let response = self.server.serve(request, reply_to, self.endpoint.rng())?;
        self.endpoint.respond(reply_to, response)
    }

    fn async_eval_batch(&mut self, inputs: &[Block]) -> Result<AsymPending<CS>> {
        self.endpoint.check_open()?;
        if inputs.is_empty() {
            return Err(Error::Batch);
        }

        let request = concat_blocks(inputs);
        let replies = self
            .endpoint
            .canonical_peers()
            .enumerate()
            .map(|(position, peer)| {
                self.endpoint
                    .request(peer, request.clone())
                    .map(|reply| (position + 1, peer, reply))
            })
            .collect::<Result<Vec<_>>>()?;

        let points = inputs
            .iter()
            .map(hash_to_group::<CS>)
            .collect::<Result<Vec<_>>>()?;
        let challenges = match self.combiner.mode {
            Mode::Malicious => inputs
                .iter()
                .map(challenge::<CS>)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let mut weighted_key = self.combiner.lagrange[0] * &self.server.key;
        let partials = points.iter().map(|point| *point * &weighted_key).collect();
        weighted_key.zeroize();

        debug!(
            party = self.endpoint.party(),
            peers = replies.len(),
            units = inputs.len(),
            mode = ?self.combiner.mode,
            "issued asymmetric evaluation"
        );

        Ok(AsymPending {
            combiner: Arc::clone(&self.combiner),
            points,
            challenges,
            partials,
            replies,
        })
    }

    fn close(&mut self) {
        self.endpoint.close();
    }

    fn shutdown(mut self) -> impl Future<Output = Result<()>> + Send {
        async move { self.endpoint.shutdown().await }
    }
}

/// Pending evaluation of the asymmetric DPRF.
#[must_use = "the evaluation result is only available through `finish` or `wait`"]
pub struct AsymPending<CS: CipherSuite> {
    combiner: Arc<Combiner<CS>>,
    points: Vec<<CS::Group as Group>::Elem>,
    challenges: Vec<<CS::Group as Group>::Scalar>,
    partials: Vec<<CS::Group as Group>::Elem>,
    /// Position in the canonical set, peer index and response.
    replies: Vec<(usize, usize, Reply)>,
}

impl<CS: CipherSuite> AsymPending<CS> {
    fn combine(&mut self, position: usize, peer: usize, response: &[u8]) -> Result<()> {
        let unit_len = response_len::<CS>(self.combiner.mode);
        let share_len = <CS::Group as Group>::ElemLen::USIZE;
        if response.len() != unit_len * self.points.len() {
            warn!(peer, bytes = response.len(), "response size mismatch");
            return Err(Error::MalformedResponse);
        }

        let coefficient = self.combiner.lagrange[position];
        for (unit, chunk) in response.chunks_exact(unit_len).enumerate() {
            let share = CS::Group::deserialize_elem(&chunk[..share_len])?;

            if self.combiner.mode == Mode::Malicious {
                let proof = Proof::<CS::Group>::deserialize(&chunk[share_len..])?;
                proof
                    .verify(
                        self.combiner.commitments[peer],
                        self.points[unit],
                        share,
                        self.challenges[unit],
                    )
                    .inspect_err(|_| warn!(peer, unit, "share proof rejected"))?;
            }

            self.partials[unit] = self.partials[unit] + &(share * &coefficient);
        }

        Ok(())
    }
}

impl<CS: CipherSuite> Completion for AsymPending<CS> {
    fn finish(mut self) -> impl Future<Output = Result<Vec<Block>>> + Send {
        async move {
            for (position, peer, reply) in core::mem::take(&mut self.replies) {
                let response = reply.await.map_err(|_| Error::ChannelClosed)?;
                self.combine(position, peer, &response)?;
            }

            Ok(self.partials.into_iter().map(finalize::<CS>).collect())
        }
    }
}
