// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Multi-party tests over in-memory channels
//!
//! Listener tasks run on a multi-threaded runtime while the test thread drives
//! the parties through the blocking API, so `wait` never runs on a worker.

mod test_parties;

use elliptic_curve::hash2curve::ExpandMsgXmd;
use p256::NistP256;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::Sha256;
use tokio::runtime::Runtime;

use crate::net::mem;
use crate::{asymmetric, symmetric, AsymDprf, CipherSuite, Dprf, Mode, Params, SymDprf};

impl CipherSuite for NistP256 {
    const ID: &'static str = "P256-SHA256";

    type Group = NistP256;

    type Hash = Sha256;

    type ExpandMsg = ExpandMsgXmd<Sha256>;
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap()
}

fn seed(party: usize) -> [u8; 32] {
    [party as u8; 32]
}

fn symmetric(
    runtime: &Runtime,
    params: Params,
    key_seed: u64,
) -> (symmetric::MasterKey, Vec<SymDprf<mem::Sender>>) {
    let key = symmetric::MasterKey::generate(params, &mut StdRng::seed_from_u64(key_seed)).unwrap();
    let parties = mem::connect(params.parties())
        .into_iter()
        .enumerate()
        .map(|(party, links)| {
            SymDprf::new(
                runtime.handle(),
                params,
                &key.share(party).unwrap(),
                links,
                seed(party),
            )
            .unwrap()
        })
        .collect();

    (key, parties)
}

fn asymmetric<CS: CipherSuite>(
    runtime: &Runtime,
    params: Params,
    mode: Mode,
    key_seed: u64,
) -> (asymmetric::MasterKey<CS>, Vec<AsymDprf<CS, mem::Sender>>) {
    let key =
        asymmetric::MasterKey::<CS>::generate(params, mode, &mut StdRng::seed_from_u64(key_seed))
            .unwrap();
    let parties = mem::connect(params.parties())
        .into_iter()
        .enumerate()
        .map(|(party, links)| {
            AsymDprf::new(
                runtime.handle(),
                params,
                mode,
                &key.share(party).unwrap(),
                links,
                seed(party),
            )
            .unwrap()
        })
        .collect();

    (key, parties)
}

/// Closes every party first, since draining waits for all peers.
fn shutdown<D: Dprf>(runtime: &Runtime, mut parties: Vec<D>) {
    for party in &mut parties {
        party.close();
    }
    for party in parties {
        runtime.block_on(party.shutdown()).unwrap();
    }
}
