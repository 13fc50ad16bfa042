// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic key generation for tests, so a test asserting on a
//! specific address or signature byte pattern does not flake across runs.

use crate::signing::PrivateKey;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

/// A private key derived from a fixed seed. Two calls with the same seed
/// always yield the same key, which is what lets E2E tests assert on a
/// proposer address without hand-writing key bytes.
pub fn deterministic_private_key(seed: u64) -> PrivateKey {
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
    let mut rng = ChaChaRng::from_seed(rng_seed);
    PrivateKey::generate_for_testing(&mut rng)
}
