// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Point-to-point channels between parties
//!
//! Every party owns two duplex channels per peer. On its *request* channel to
//! a peer it sends evaluation requests and receives the matching responses; on
//! its *listen* channel from that peer it receives the peer's requests and
//! sends back its shares. Both directions must deliver messages in FIFO order.

pub mod mem;

use core::future::Future;

use crate::Result;

/// Sending half of a channel.
pub trait Sender: Clone + Send + Sync + 'static {
    /// Queues `message` for delivery without blocking.
    ///
    /// # Errors
    /// [`Error::ChannelClosed`](crate::Error::ChannelClosed) if the receiving
    /// half is gone.
    fn send(&self, message: Vec<u8>) -> Result<()>;
}

/// Receiving half of a channel.
pub trait Receiver: Send + 'static {
    /// Waits for the next message.
    ///
    /// # Errors
    /// [`Error::ChannelClosed`](crate::Error::ChannelClosed) once the sending
    /// half is gone and every queued message was received.
    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Both halves of one channel end.
#[derive(Debug)]
pub struct Duplex<S, R> {
    /// Outgoing half.
    pub sender: S,
    /// Incoming half.
    pub receiver: R,
}

/// All channels of one party, indexed by peer slot: peer `p` sits at `p` if
/// it precedes the party and at `p - 1` otherwise.
#[derive(Debug)]
pub struct Links<S, R> {
    /// Channels this party sends requests on.
    pub requests: Vec<Duplex<S, R>>,
    /// Channels this party serves requests from.
    pub listens: Vec<Duplex<S, R>>,
}
