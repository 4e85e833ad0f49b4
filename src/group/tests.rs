// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Includes a series of tests for the group implementations

use proptest::collection::vec;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use subtle::ConstantTimeEq;

use crate::{Error, Group, Result};

#[test]
fn test_group_properties() -> Result<()> {
    #[cfg(feature = "ristretto255")]
    {
        use crate::Ristretto255;

        test_identity_element_error::<Ristretto255>()?;
        test_zero_scalar_error::<Ristretto255>()?;
        test_scalar_arithmetic::<Ristretto255>();
        test_serialization::<Ristretto255>()?;
    }

    test_identity_element_error::<p256::NistP256>()?;
    test_zero_scalar_error::<p256::NistP256>()?;
    test_scalar_arithmetic::<p256::NistP256>();
    test_serialization::<p256::NistP256>()?;

    Ok(())
}

// Checks that the identity element cannot be deserialized
fn test_identity_element_error<G: Group>() -> Result<()> {
    let identity = G::identity_elem();
    let result = G::deserialize_elem(&G::serialize_elem(identity));
    assert!(matches!(result, Err(Error::Deserialization)));

    Ok(())
}

// Checks that the zero scalar cannot be deserialized
fn test_zero_scalar_error<G: Group>() -> Result<()> {
    let zero_scalar = G::zero_scalar();
    let result = G::deserialize_scalar(&G::serialize_scalar(zero_scalar));
    assert!(matches!(result, Err(Error::Deserialization)));

    Ok(())
}

fn test_scalar_arithmetic<G: Group>() {
    let mut rng = StdRng::seed_from_u64(7);
    let scalar = G::random_scalar(&mut rng);
    let one = G::scalar_from_u64(1);

    assert!(bool::from(
        (scalar * &G::invert_scalar(scalar)).ct_eq(&one)
    ));
    assert!(bool::from(G::is_zero_scalar(scalar - &scalar)));
    assert!(bool::from(
        (G::scalar_from_u64(2) + &G::scalar_from_u64(3)).ct_eq(&G::scalar_from_u64(5))
    ));
    assert!(bool::from(G::is_zero_scalar(G::invert_scalar(
        G::zero_scalar()
    ))));
}

fn test_serialization<G: Group>() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    let scalar = G::random_scalar(&mut rng);
    let elem = G::base_elem() * &scalar;

    let decoded = G::deserialize_elem(&G::serialize_elem(elem))?;
    assert!(bool::from(decoded.ct_eq(&elem)));
    assert!(!bool::from(G::is_identity_elem(decoded)));

    let decoded = G::deserialize_scalar(&G::serialize_scalar(scalar))?;
    assert!(bool::from(decoded.ct_eq(&scalar)));

    Ok(())
}

proptest! {
    #[test]
    fn test_nocrash_deserialize_elem(bytes in vec(any::<u8>(), 0..200)) {
        #[cfg(feature = "ristretto255")]
        {
            let _ = crate::Ristretto255::deserialize_elem(&bytes);
        }
        let _ = p256::NistP256::deserialize_elem(&bytes);
    }

    #[test]
    fn test_nocrash_deserialize_scalar(bytes in vec(any::<u8>(), 0..200)) {
        #[cfg(feature = "ristretto255")]
        {
            let _ = crate::Ristretto255::deserialize_scalar(&bytes);
        }
        let _ = p256::NistP256::deserialize_scalar(&bytes);
    }
}
