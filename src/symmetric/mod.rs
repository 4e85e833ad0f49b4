// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The symmetric DPRF: combinatorial secret sharing of AES-128 keys
//!
//! Every `(n - m + 1)`-sized subset of parties shares one key and the PRF is
//! the XOR of `AES_k(x)` over all keys. Any `m` parties jointly hold every
//! key; each key is applied by exactly one of them so that the XOR of their
//! shares is the PRF value. This scheme does not detect wrong shares.

mod key;

use core::future::Future;
use std::sync::Arc;

use rand_chacha::ChaCha20Rng;
use tokio::runtime::Handle;
use tracing::{debug, warn};

pub use self::key::{KeyShare, MasterKey, MAX_KEYS};
use self::key::{binomial, key_count};
use crate::cipher::MultiKeyAes;
use crate::endpoint::{Endpoint, Reply, Server};
use crate::net::{Links, Receiver, Sender};
use crate::util::{concat_blocks, split_blocks, xor_in_place, Block};
use crate::{Completion, Dprf, Error, Lifecycle, Params, Result, Variant};

struct DefaultKeys {
    indices: Vec<usize>,
    cipher: MultiKeyAes,
}

/// Serves requests with the keys not covered by parties before this one.
pub(crate) struct SymServer {
    party: usize,
    default_keys: Vec<Option<DefaultKeys>>,
}

impl SymServer {
    pub(crate) fn new(params: Params, share: &KeyShare) -> Result<Self> {
        let party = share.party();
        let parties = params.parties();
        params.check_party(party)?;

        let subset_len = parties - params.threshold() + 1;
        let count = key_count(parties, subset_len)?;
        let per_party = binomial(parties - 1, subset_len - 1)?;
        let structure = share.key_structure();
        if structure.len() != parties
            || structure.iter().any(|row| {
                row.len() != per_party || row.iter().any(|&index| index >= count)
            })
            || share.keys().len() != per_party
        {
            return Err(Error::Parameters);
        }

        let mut default_keys: Vec<Option<DefaultKeys>> = (0..parties).map(|_| None).collect();
        // Only requesters whose canonical set contains this party.
        for offset in 0..params.threshold() {
            let requester = (party + parties - offset) % parties;

            let mut covered = vec![false; count];
            let mut holder = requester;
            while holder != party {
                for &index in &structure[holder] {
                    covered[index] = true;
                }
                holder = (holder + 1) % parties;
            }

            let (indices, keys): (Vec<usize>, Vec<Block>) = structure[party]
                .iter()
                .zip(share.keys())
                .filter(|(index, _)| !covered[**index])
                .map(|(index, key)| (*index, *key))
                .unzip();

            default_keys[requester] = Some(DefaultKeys {
                indices,
                cipher: MultiKeyAes::new(&keys),
            });
        }

        Ok(Self {
            party,
            default_keys,
        })
    }

    fn keys_for(&self, requester: usize) -> Result<&DefaultKeys> {
        self.default_keys
            .get(requester)
            .and_then(Option::as_ref)
            .ok_or(Error::UnexpectedRequester { party: requester })
    }

    /// Global indices of the keys applied for `requester`.
    #[cfg(test)]
    pub(crate) fn key_indices(&self, requester: usize) -> Result<&[usize]> {
        self.keys_for(requester).map(|keys| keys.indices.as_slice())
    }

    /// The share of this party for `inputs` requested by `requester`.
    pub(crate) fn evaluate(&self, inputs: &[Block], requester: usize) -> Result<Vec<Block>> {
        let keys = self.keys_for(requester)?;
        debug_assert_eq!(keys.indices.len(), keys.cipher.len());

        Ok(match inputs {
            [input] => vec![keys.cipher.encrypt_xor(input)],
            _ => keys.cipher.encrypt_xor_batch(inputs),
        })
    }
}

impl Server for SymServer {
    fn serve(&self, request: &[u8], requester: usize, _: &mut ChaCha20Rng) -> Result<Vec<u8>> {
        let inputs = split_blocks(request)?;
        let shares = self.evaluate(&inputs, requester)?;
        Ok(concat_blocks(&shares))
    }
}

/// A party of the symmetric DPRF.
pub struct SymDprf<S: Sender> {
    server: Arc<SymServer>,
    endpoint: Endpoint<S>,
}

impl<S: Sender> SymDprf<S> {
    /// Starts the party holding `share`, connected to its peers through
    /// `links`. Listener tasks are spawned on `runtime`; `seed` seeds the
    /// party's randomness.
    ///
    /// # Errors
    /// [`Error::Parameters`] if the share doesn't match `params` or `links`
    /// doesn't hold one channel per peer.
    pub fn new<R: Receiver>(
        runtime: &Handle,
        params: Params,
        share: &KeyShare,
        links: Links<S, R>,
        seed: [u8; 32],
    ) -> Result<Self> {
        let server = Arc::new(SymServer::new(params, share)?);
        let endpoint = Endpoint::start(
            runtime,
            params,
            share.party(),
            links,
            Arc::clone(&server),
            seed,
        )?;

        Ok(Self { server, endpoint })
    }
}

impl<S: Sender> Dprf for SymDprf<S> {
    type Pending = SymPending;

    fn variant(&self) -> Variant {
        Variant::Symmetric
    }

    fn party(&self) -> usize {
        self.server.party
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

    fn async_eval_batch(&mut self, inputs: &[Block]) -> Result<SymPending> {
        // With a threshold of one no request goes out to notice the close.
        self.endpoint.check_open()?;
        if inputs.is_empty() {
            return Err(Error::Batch);
        }

        let request = concat_blocks(inputs);
        let replies = self
            .endpoint
            .canonical_peers()
            .map(|peer| {
                self.endpoint
                    .request(peer, request.clone())
                    .map(|reply| (peer, reply))
            })
            .collect::<Result<Vec<_>>>()?;
        let local = self.server.evaluate(inputs, self.server.party)?;

        debug!(
            party = self.server.party,
            peers = replies.len(),
            units = inputs.len(),
            "issued symmetric evaluation"
        );

        Ok(SymPending { local, replies })
    }

    fn close(&mut self) {
        self.endpoint.close();
    }

    fn shutdown(mut self) -> impl Future<Output = Result<()>> + Send {
        async move { self.endpoint.shutdown().await }
    }
}

/// Pending evaluation of the symmetric DPRF.
#[must_use = "the evaluation result is only available through `finish` or `wait`"]
pub struct SymPending {
    local: Vec<Block>,
    replies: Vec<(usize, Reply)>,
}

impl Completion for SymPending {
    fn finish(self) -> impl Future<Output = Result<Vec<Block>>> + Send {
        async move {
            let mut outputs = self.local;

            for (peer, reply) in self.replies {
                let response = reply.await.map_err(|_| Error::ChannelClosed)?;
                let shares = split_blocks(&response).map_err(|_| Error::MalformedResponse)?;
                if shares.len() != outputs.len() {
                    warn!(peer, units = shares.len(), "share count mismatch");
                    return Err(Error::MalformedResponse);
                }

                for (output, share) in outputs.iter_mut().zip(&shares) {
                    xor_in_place(output, share);
                }
            }

            Ok(outputs)
        }
    }
}
