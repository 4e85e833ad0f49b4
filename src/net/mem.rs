// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! In-memory channels connecting parties of the same process

use core::future::Future;

use futures::channel::mpsc;
use futures::StreamExt;

use super::{Duplex, Links};
use crate::{Error, Result};

/// Sending half of an in-memory channel.
#[derive(Clone, Debug)]
pub struct Sender {
    inner: mpsc::UnboundedSender<Vec<u8>>,
}

impl super::Sender for Sender {
    fn send(&self, message: Vec<u8>) -> Result<()> {
        self.inner
            .unbounded_send(message)
            .map_err(|_| Error::ChannelClosed)
    }
}

/// Receiving half of an in-memory channel.
#[derive(Debug)]
pub struct Receiver {
    inner: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl super::Receiver for Receiver {
    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move { self.inner.next().await.ok_or(Error::ChannelClosed) }
    }
}

fn pipe() -> (Sender, Receiver) {
    let (inner_sender, inner_receiver) = mpsc::unbounded();
    (
        Sender {
            inner: inner_sender,
        },
        Receiver {
            inner: inner_receiver,
        },
    )
}

/// Connects `parties` parties with each other.
///
/// Entry `i` of the result holds the channels of party `i`. For every ordered
/// pair `(i, j)`, party `i`'s request channel to `j` is wired to party `j`'s
/// listen channel from `i`.
pub fn connect(parties: usize) -> Vec<Links<Sender, Receiver>> {
    let mut links: Vec<Links<Sender, Receiver>> = (0..parties)
        .map(|_| Links {
            requests: Vec::with_capacity(parties.saturating_sub(1)),
            listens: Vec::with_capacity(parties.saturating_sub(1)),
        })
        .collect();

    // Iterating requesters in ascending order keeps every listen vector
    // sorted by peer index as well.
    for requester in 0..parties {
        for server in (0..parties).filter(|&server| server != requester) {
            let (request_sender, request_receiver) = pipe();
            let (response_sender, response_receiver) = pipe();

            links[requester].requests.push(Duplex {
                sender: request_sender,
                receiver: response_receiver,
            });
            links[server].listens.push(Duplex {
                sender: response_sender,
                receiver: request_receiver,
            });
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Receiver as _, Sender as _};
    use crate::Params;

    #[tokio::test]
    async fn test_connect_wires_slots() {
        let params = Params::new(3, 2).unwrap();
        let mut links = connect(3);

        for party in 0..3 {
            assert_eq!(links[party].requests.len(), 2);
            assert_eq!(links[party].listens.len(), 2);
        }

        // Party 2 asks party 0, which answers on its listen channel from 2.
        let to_zero = params.slot(2, 0).unwrap();
        let from_two = params.slot(0, 2).unwrap();

        links[2].requests[to_zero]
            .sender
            .send(b"request".to_vec())
            .unwrap();
        let request = links[0].listens[from_two].receiver.recv().await.unwrap();
        assert_eq!(request, b"request");

        links[0].listens[from_two]
            .sender
            .send(b"response".to_vec())
            .unwrap();
        let response = links[2].requests[to_zero].receiver.recv().await.unwrap();
        assert_eq!(response, b"response");
    }

    #[tokio::test]
    async fn test_fifo_and_close() {
        let (sender, mut receiver) = pipe();

        for i in 0..10u8 {
            sender.send(vec![i]).unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(receiver.recv().await.unwrap(), [i]);
        }

        drop(sender);
        assert_eq!(receiver.recv().await, Err(Error::ChannelClosed));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (sender, receiver) = pipe();
        drop(receiver);

        assert_eq!(sender.send(vec![1]), Err(Error::ChannelClosed));
    }
}
