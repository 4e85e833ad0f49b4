// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use p256::NistP256;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::Runtime;

use super::{asymmetric, runtime, seed, shutdown, symmetric};
use crate::asymmetric::KeyShare;
use crate::net::mem;
use crate::util::xor_in_place;
use crate::{
    AnyDprf, AsymDprf, Block, CipherSuite, Completion, Dprf, Error, Group, Lifecycle, Mode,
    Params, Variant,
};

const SHAPES: [(usize, usize); 6] = [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (4, 4)];

fn inputs(count: u8) -> Vec<Block> {
    (0..count).map(|i| [i.wrapping_mul(37); 16]).collect()
}

#[test]
fn test_symmetric_consistency() {
    let runtime = runtime();

    for (parties, threshold) in SHAPES {
        let params = Params::new(parties, threshold).unwrap();
        let (key, mut dprfs) = symmetric(&runtime, params, parties as u64);

        for input in inputs(3) {
            let expected = key.evaluate(&input);
            for dprf in &mut dprfs {
                assert_eq!(dprf.eval(input).unwrap(), expected, "{parties}/{threshold}");
            }
        }

        shutdown(&runtime, dprfs);
    }
}

fn asymmetric_consistency<CS: CipherSuite>(mode: Mode) {
    let runtime = runtime();

    for (parties, threshold) in SHAPES {
        let params = Params::new(parties, threshold).unwrap();
        let (key, mut dprfs) = asymmetric::<CS>(&runtime, params, mode, parties as u64);
        assert_eq!(dprfs[0].variant(), Variant::Asymmetric(mode));

        for input in inputs(2) {
            let expected = key.evaluate(&input).unwrap();
            for dprf in &mut dprfs {
                assert_eq!(dprf.eval(input).unwrap(), expected, "{parties}/{threshold}");
            }
        }

        shutdown(&runtime, dprfs);
    }
}

#[test]
fn test_asymmetric_consistency() {
    #[cfg(feature = "ristretto255-ciphersuite")]
    {
        asymmetric_consistency::<crate::Ristretto255>(Mode::SemiHonest);
        asymmetric_consistency::<crate::Ristretto255>(Mode::Malicious);
    }

    asymmetric_consistency::<NistP256>(Mode::SemiHonest);
    asymmetric_consistency::<NistP256>(Mode::Malicious);
}

// Party 0 of a 4-party, threshold 2 deployment, compared against plain AES
// over the keys held by its canonical set {0, 1}.
#[test]
fn test_symmetric_known_cover() {
    let runtime = runtime();
    let params = Params::new(4, 2).unwrap();
    let (key, mut dprfs) = symmetric(&runtime, params, 42);

    let mut indices: Vec<usize> = key.key_structure()[0]
        .iter()
        .chain(&key.key_structure()[1])
        .copied()
        .collect();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices, [0, 1, 2, 3]);

    let input: Block = *b"sixteen byte msg";
    let mut expected = [0; 16];
    for index in indices {
        let mut block = aes::Block::from(input);
        Aes128::new_from_slice(&key.keys()[index])
            .unwrap()
            .encrypt_block(&mut block);
        xor_in_place(&mut expected, &block);
    }

    assert_eq!(dprfs[0].eval(input).unwrap(), expected);

    // The same seed deals the same keys.
    let (again, _) = symmetric(&runtime, params, 42);
    assert_eq!(again.keys(), key.keys());

    shutdown(&runtime, dprfs);
}

fn batch_and_pipelining<D: Dprf>(dprfs: &mut [D]) {
    let inputs = inputs(8);
    let singles: Vec<Block> = inputs.iter().map(|&input| dprfs[0].eval(input).unwrap()).collect();

    assert_eq!(dprfs[1].async_eval_batch(&inputs).unwrap().wait().unwrap(), singles);

    // Handles resolve to their own input whatever the completion order.
    let pending: Vec<_> = inputs
        .iter()
        .map(|&input| dprfs[0].async_eval(input).unwrap())
        .collect();
    for (expected, pending) in singles.iter().zip(pending).rev() {
        assert_eq!(pending.wait().unwrap(), vec![*expected]);
    }

    assert!(matches!(dprfs[0].async_eval_batch(&[]), Err(Error::Batch)));
}

#[test]
fn test_batch_and_pipelining() {
    let runtime = runtime();
    let params = Params::new(5, 3).unwrap();

    let (_, mut dprfs) = symmetric(&runtime, params, 7);
    batch_and_pipelining(&mut dprfs);
    shutdown(&runtime, dprfs);

    let (_, mut dprfs) = asymmetric::<NistP256>(&runtime, params, Mode::Malicious, 7);
    batch_and_pipelining(&mut dprfs);
    shutdown(&runtime, dprfs);
}

#[test]
fn test_async_finish_on_runtime() {
    let runtime = runtime();
    let params = Params::new(3, 3).unwrap();
    let (key, mut dprfs) = symmetric(&runtime, params, 8);
    let input = [9; 16];

    let pending = dprfs[2].async_eval(input).unwrap();
    let outputs = runtime.block_on(pending.finish()).unwrap();
    assert_eq!(outputs, [key.evaluate(&input)]);

    shutdown(&runtime, dprfs);
}

#[test]
fn test_serve_one() {
    let runtime = runtime();
    let params = Params::new(5, 2).unwrap();
    let (_, mut dprfs) = symmetric(&runtime, params, 9);

    assert!(matches!(
        dprfs[0].serve_one(&[0; 15], 4),
        Err(Error::MalformedRequest)
    ));
    // Party 2's canonical set is {2, 3}.
    assert!(matches!(
        dprfs[0].serve_one(&[0; 16], 2),
        Err(Error::UnexpectedRequester { party: 2 })
    ));
    // A party doesn't answer itself.
    assert!(matches!(
        dprfs[0].serve_one(&[0; 16], 0),
        Err(Error::Parameters)
    ));
    assert!(matches!(
        dprfs[0].serve_one(&[0; 16], 5),
        Err(Error::UnexpectedRequester { party: 5 })
    ));
    assert!(dprfs[0].serve_one(&[0; 16], 4).is_ok());

    shutdown(&runtime, dprfs);
}

fn malicious_share_detected<CS: CipherSuite>() {
    let runtime = runtime();
    let params = Params::new(3, 2).unwrap();
    let key =
        asymmetric::MasterKey::<CS>::generate(params, Mode::Malicious, &mut StdRng::seed_from_u64(10))
            .unwrap();
    let wrong = CS::Group::random_scalar(&mut StdRng::seed_from_u64(11));

    let mut dprfs: Vec<_> = mem::connect(3)
        .into_iter()
        .enumerate()
        .map(|(party, links)| {
            let share = match party {
                // Keeps the honest commitments.
                1 => KeyShare::new(1, wrong, key.commitments().to_vec()),
                _ => key.share(party).unwrap(),
            };
            AsymDprf::new(runtime.handle(), params, Mode::Malicious, &share, links, seed(party))
                .unwrap()
        })
        .collect();

    let input = [12; 16];
    // Party 0 relies on party 1, party 2 on party 0.
    assert!(matches!(dprfs[0].eval(input), Err(Error::ProofVerification)));
    assert_eq!(dprfs[2].eval(input).unwrap(), key.evaluate(&input).unwrap());

    shutdown(&runtime, dprfs);
}

#[test]
fn test_malicious_share_detected() {
    #[cfg(feature = "ristretto255-ciphersuite")]
    malicious_share_detected::<crate::Ristretto255>();

    malicious_share_detected::<NistP256>();
}

#[test]
fn test_semi_honest_wrong_share_goes_unnoticed() {
    let runtime = runtime();
    let params = Params::new(3, 2).unwrap();
    let key = asymmetric::MasterKey::<NistP256>::generate(
        params,
        Mode::SemiHonest,
        &mut StdRng::seed_from_u64(13),
    )
    .unwrap();
    let wrong = NistP256::random_scalar(&mut StdRng::seed_from_u64(14));

    let mut dprfs: Vec<_> = mem::connect(3)
        .into_iter()
        .enumerate()
        .map(|(party, links)| {
            let share = match party {
                1 => KeyShare::new(1, wrong, Vec::new()),
                _ => key.share(party).unwrap(),
            };
            AsymDprf::new(runtime.handle(), params, Mode::SemiHonest, &share, links, seed(party))
                .unwrap()
        })
        .collect();

    let input = [15; 16];
    assert_ne!(dprfs[0].eval(input).unwrap(), key.evaluate(&input).unwrap());

    shutdown(&runtime, dprfs);
}

#[test]
fn test_rejected_configurations() {
    let runtime = runtime();
    let params = Params::new(2, 2).unwrap();
    let key = asymmetric::MasterKey::<NistP256>::generate(
        params,
        Mode::Malicious,
        &mut StdRng::seed_from_u64(16),
    )
    .unwrap();
    let mut links = mem::connect(2);

    let share = key.share(0).unwrap();
    assert!(matches!(
        AsymDprf::new(
            runtime.handle(),
            params,
            Mode::PubliclyVerifiable,
            &share,
            links.remove(0),
            seed(0)
        ),
        Err(Error::UnimplementedVariant)
    ));

    let bare = KeyShare::<NistP256>::new(1, share.secret(), Vec::new());
    assert!(matches!(
        AsymDprf::new(runtime.handle(), params, Mode::Malicious, &bare, links.remove(0), seed(1)),
        Err(Error::Commitments)
    ));

    // Channels for another party count.
    let share = key.share(0).unwrap();
    assert!(matches!(
        AsymDprf::new(
            runtime.handle(),
            params,
            Mode::Malicious,
            &share,
            mem::connect(3).remove(0),
            seed(0)
        ),
        Err(Error::Parameters)
    ));
}

#[test]
fn test_lifecycle() {
    let runtime = runtime();
    let params = Params::new(3, 2).unwrap();
    let (_, mut dprfs) = symmetric(&runtime, params, 17);

    assert_eq!(dprfs[0].lifecycle(), Lifecycle::Open);
    dprfs[0].close();
    dprfs[0].close();
    assert_eq!(dprfs[0].lifecycle(), Lifecycle::Draining);
    assert!(matches!(dprfs[0].eval([0; 16]), Err(Error::Closed)));

    // The others still get served by party 0.
    assert!(dprfs[2].eval([0; 16]).is_ok());

    shutdown(&runtime, dprfs);
}

// Without peers to ask, the lifecycle alone stops a closed party.
#[test]
fn test_closed_party_without_peers() {
    let runtime = runtime();
    let params = Params::new(3, 1).unwrap();
    let (key, mut dprfs) = symmetric(&runtime, params, 24);
    let (_, mut asym) = asymmetric::<NistP256>(&runtime, params, Mode::SemiHonest, 24);

    dprfs[0].close();
    asym[0].close();
    assert!(matches!(dprfs[0].eval([1; 16]), Err(Error::Closed)));
    assert!(matches!(dprfs[0].async_eval_batch(&[[1; 16]]).err(), Some(Error::Closed)));
    assert!(matches!(asym[0].eval([1; 16]), Err(Error::Closed)));
    assert!(matches!(asym[0].async_eval_batch(&[[1; 16]]).err(), Some(Error::Closed)));

    assert_eq!(dprfs[1].eval([1; 16]).unwrap(), key.evaluate(&[1; 16]));

    shutdown(&runtime, dprfs);
    shutdown(&runtime, asym);
}

fn dropped_party_stops_serving<D: Dprf>(runtime: &Runtime, mut dprfs: Vec<D>) {
    assert!(dprfs[0].eval([3; 16]).is_ok());

    // Party 0 relies on party 1, which goes away without a shutdown.
    drop(dprfs.pop());
    assert!(matches!(dprfs[0].eval([3; 16]), Err(Error::ChannelClosed)));

    shutdown(runtime, dprfs);
}

#[test]
fn test_dropped_party_stops_serving() {
    let runtime = runtime();
    let params = Params::new(2, 2).unwrap();

    let (_, dprfs) = symmetric(&runtime, params, 25);
    dropped_party_stops_serving(&runtime, dprfs);

    let (_, dprfs) = asymmetric::<NistP256>(&runtime, params, Mode::Malicious, 25);
    dropped_party_stops_serving(&runtime, dprfs);
}

#[test]
fn test_any_dprf() {
    let runtime = runtime();
    let params = Params::new(4, 3).unwrap();

    let (key, dprfs) = symmetric(&runtime, params, 18);
    let mut dprfs: Vec<AnyDprf<NistP256, _>> = dprfs.into_iter().map(AnyDprf::from).collect();
    assert_eq!(dprfs[3].variant(), Variant::Symmetric);
    assert_eq!(dprfs[3].party(), 3);
    assert_eq!(dprfs[3].params(), params);
    assert_eq!(dprfs[3].eval([1; 16]).unwrap(), key.evaluate(&[1; 16]));
    shutdown(&runtime, dprfs);

    let (key, dprfs) = asymmetric::<NistP256>(&runtime, params, Mode::SemiHonest, 18);
    let mut dprfs: Vec<AnyDprf<NistP256, _>> = dprfs.into_iter().map(AnyDprf::from).collect();
    assert_eq!(dprfs[1].variant(), Variant::Asymmetric(Mode::SemiHonest));
    let outputs = dprfs[1]
        .async_eval_batch(&[[1; 16], [2; 16]])
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(
        outputs,
        [key.evaluate(&[1; 16]).unwrap(), key.evaluate(&[2; 16]).unwrap()]
    );
    shutdown(&runtime, dprfs);
}
