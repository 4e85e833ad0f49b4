// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Defines the CipherSuite trait to specify the underlying primitives of the
//! asymmetric DPRF

use digest::Digest;
use elliptic_curve::hash2curve::ExpandMsg;

use crate::Group;

/// Configures the underlying primitives used by the asymmetric DPRF
pub trait CipherSuite: Send + Sync + 'static {
    /// The ciphersuite identifier, mixed into every domain separation tag
    const ID: &'static str;

    /// A finite cyclic group along with a point representation that allows
    /// some customization on how to hash an input to a curve point. See
    /// [`Group`].
    type Group: Group;

    /// The random oracle used to finalize outputs.
    type Hash: Digest;

    /// The `expand_message` variant used to hash inputs to the group and to
    /// derive proof challenges.
    type ExpandMsg: for<'a> ExpandMsg<'a>;
}
