// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Per-party networking shared by both schemes: issuing requests, routing
//! responses to completion handles, serving peers and draining on shutdown

use std::sync::Arc;

use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::net::{Duplex, Links, Receiver, Sender};
use crate::util::CLOSE_SENTINEL;
use crate::{Error, Params, Result};

/// Answers the requests of one scheme.
pub(crate) trait Server: Send + Sync + 'static {
    /// Computes the response to `request` from `requester`.
    fn serve(&self, request: &[u8], requester: usize, rng: &mut ChaCha20Rng) -> Result<Vec<u8>>;
}

/// Lifecycle of a party.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Lifecycle {
    /// Requests may be issued.
    Open,
    /// Close signals were sent; waiting for every peer to close in turn.
    Draining,
    /// Every listener stopped.
    Closed,
}

/// Receives the response to an issued request.
pub(crate) type Reply = oneshot::Receiver<Vec<u8>>;

type Waiter = oneshot::Sender<Vec<u8>>;

struct Requester<S> {
    sender: S,
    waiters: mpsc::UnboundedSender<Waiter>,
}

pub(crate) struct Endpoint<S: Sender> {
    party: usize,
    params: Params,
    requesters: Vec<Requester<S>>,
    responders: Vec<S>,
    lifecycle: Lifecycle,
    drained: Option<oneshot::Receiver<()>>,
    tasks: Vec<JoinHandle<()>>,
    rng: ChaCha20Rng,
}

impl<S: Sender> Endpoint<S> {
    /// Spawns the routers, listeners and the drain task of `party` on
    /// `runtime`.
    pub(crate) fn start<R: Receiver, V: Server>(
        runtime: &Handle,
        params: Params,
        party: usize,
        links: Links<S, R>,
        server: Arc<V>,
        seed: [u8; 32],
    ) -> Result<Self> {
        params.check_party(party)?;
        let peers = params.parties() - 1;
        if links.requests.len() != peers || links.listens.len() != peers {
            return Err(Error::Parameters);
        }

        let mut tasks = Vec::with_capacity(2 * peers + 1);
        let mut requesters = Vec::with_capacity(peers);
        for (slot, Duplex { sender, receiver }) in links.requests.into_iter().enumerate() {
            let (waiters, pending) = mpsc::unbounded();
            tasks.push(runtime.spawn(route(party, Params::peer(party, slot), receiver, pending)));
            requesters.push(Requester { sender, waiters });
        }

        let (events, closed) = mpsc::unbounded();
        let (done, drained) = oneshot::channel();
        tasks.push(runtime.spawn(drain(party, closed, peers, done)));

        let mut responders = Vec::with_capacity(peers);
        for (slot, channel) in links.listens.into_iter().enumerate() {
            let peer = Params::peer(party, slot);
            responders.push(channel.sender.clone());

            let mut rng = ChaCha20Rng::from_seed(seed);
            rng.set_stream(peer as u64 + 1);
            let listener = Listener {
                party,
                peer,
                channel,
                server: Arc::clone(&server),
                rng,
                events: events.clone(),
            };
            tasks.push(runtime.spawn(listener.run()));
        }

        Ok(Self {
            party,
            params,
            requesters,
            responders,
            lifecycle: Lifecycle::Open,
            drained: Some(drained),
            tasks,
            rng: ChaCha20Rng::from_seed(seed),
        })
    }

    pub(crate) fn party(&self) -> usize {
        self.party
    }

    pub(crate) fn params(&self) -> Params {
        self.params
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// The `m - 1` peers this party requests shares from.
    pub(crate) fn canonical_peers(&self) -> impl Iterator<Item = usize> {
        self.params.canonical_set(self.party).skip(1)
    }

    /// Fails with [`Error::Closed`] once [`close`](Self::close) was called.
    pub(crate) fn check_open(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Draining | Lifecycle::Closed => Err(Error::Closed),
        }
    }

    /// Sends `request` to `peer` and returns where its response will arrive.
    pub(crate) fn request(&self, peer: usize, request: Vec<u8>) -> Result<Reply> {
        self.check_open()?;

        let requester = &self.requesters[self.params.slot(self.party, peer)?];
        let (waiter, reply) = oneshot::channel();
        // The waiter is queued before the request leaves so the router always
        // finds it when the response comes back.
        requester
            .waiters
            .unbounded_send(waiter)
            .map_err(|_| Error::ChannelClosed)?;
        requester.sender.send(request)?;

        Ok(reply)
    }

    /// Sends `response` back to `peer`.
    pub(crate) fn respond(&self, peer: usize, response: Vec<u8>) -> Result<()> {
        self.responders[self.params.slot(self.party, peer)?].send(response)
    }

    pub(crate) fn close(&mut self) {
        if self.lifecycle != Lifecycle::Open {
            return;
        }

        self.lifecycle = Lifecycle::Draining;
        for (slot, requester) in self.requesters.iter().enumerate() {
            if let Err(err) = requester.sender.send(vec![CLOSE_SENTINEL]) {
                warn!(
                    party = self.party,
                    peer = Params::peer(self.party, slot),
                    %err,
                    "failed to send close signal"
                );
            }
        }
        debug!(party = self.party, "close signals sent");
    }

    /// Closes the party and waits until every peer closed as well.
    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.close();

        if let Some(drained) = self.drained.take() {
            drained.await.map_err(|_| Error::ChannelClosed)?;
        }
        self.lifecycle = Lifecycle::Closed;
        self.tasks.clear();
        info!(party = self.party, "all listeners drained");

        Ok(())
    }
}

impl<S: Sender> Drop for Endpoint<S> {
    fn drop(&mut self) {
        self.close();

        // Tasks of a party that never drained must not outlive it.
        if self.lifecycle != Lifecycle::Closed {
            for task in &self.tasks {
                task.abort();
            }
            debug!(party = self.party, tasks = self.tasks.len(), "aborted background tasks");
        }
    }
}

/// Hands every response of `peer` to the oldest pending waiter.
async fn route<R: Receiver>(
    party: usize,
    peer: usize,
    mut receiver: R,
    mut waiters: mpsc::UnboundedReceiver<Waiter>,
) {
    loop {
        let response = match receiver.recv().await {
            Ok(response) => response,
            Err(_) => {
                trace!(party, peer, "response channel closed");
                return;
            }
        };

        match waiters.try_next() {
            Ok(Some(waiter)) => {
                if waiter.send(response).is_err() {
                    debug!(party, peer, "completion handle dropped before its response");
                }
            }
            Ok(None) => return,
            Err(_) => warn!(party, peer, "dropping unsolicited response"),
        }
    }
}

/// Counts closed listeners and fires `done` once none is left.
async fn drain(
    party: usize,
    mut closed: mpsc::UnboundedReceiver<usize>,
    mut open: usize,
    done: oneshot::Sender<()>,
) {
    while open > 0 {
        match closed.next().await {
            Some(peer) => {
                open -= 1;
                debug!(party, peer, open, "listener closed");
            }
            None => break,
        }
    }

    let _ = done.send(());
}

enum ListenerState {
    AwaitingRequest,
    Serving(Vec<u8>),
    Closed,
}

/// Serves the requests of one peer until it sends the close signal.
struct Listener<S, R, V> {
    party: usize,
    peer: usize,
    channel: Duplex<S, R>,
    server: Arc<V>,
    rng: ChaCha20Rng,
    events: mpsc::UnboundedSender<usize>,
}

impl<S: Sender, R: Receiver, V: Server> Listener<S, R, V> {
    async fn run(mut self) {
        let (party, peer) = (self.party, self.peer);
        let mut state = ListenerState::AwaitingRequest;

        loop {
            state = match state {
                ListenerState::AwaitingRequest => match self.channel.receiver.recv().await {
                    Ok(message) if message.len() == 1 => ListenerState::Closed,
                    Ok(message) => ListenerState::Serving(message),
                    Err(_) => {
                        warn!(party, peer, "request channel closed without close signal");
                        ListenerState::Closed
                    }
                },
                ListenerState::Serving(request) => {
                    trace!(party, peer, bytes = request.len(), "serving request");
                    // A rejected request is answered with an empty response so
                    // the requester fails instead of waiting forever.
                    let response = self
                        .server
                        .serve(&request, peer, &mut self.rng)
                        .unwrap_or_else(|err| {
                            error!(party, peer, %err, "rejecting request");
                            Vec::new()
                        });

                    match self.channel.sender.send(response) {
                        Ok(()) => ListenerState::AwaitingRequest,
                        Err(err) => {
                            warn!(party, peer, %err, "response channel closed");
                            ListenerState::Closed
                        }
                    }
                }
                ListenerState::Closed => {
                    let _ = self.events.unbounded_send(peer);
                    return;
                }
            };
        }
    }
}
