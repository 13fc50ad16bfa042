// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared `proptest` strategies reused across the workspace's property
//! tests, mainly for the trie's randomized insert/update/delete tests and
//! for transaction-ordering tests in the block manager.

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashSet;

/// Picks an existing index into a non-empty slice, for tests that need to
/// repeatedly select "some element already inserted" (e.g. delete a key
/// that is known to exist in the trie under construction).
pub fn index(len: usize) -> impl Strategy<Value = Index> {
    prop::sample::index(len)
}

/// A set of `count` distinct byte keys of length `key_len`, generated
/// without replacement so trie tests never accidentally insert the same
/// key twice and mistake an update for an insert.
pub fn distinct_keys(key_len: usize, count: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    vec(vec(any::<u8>(), key_len), count * 4)
        .prop_map(move |candidates| {
            let mut seen = HashSet::new();
            let mut out = Vec::with_capacity(count);
            for candidate in candidates {
                if out.len() == count {
                    break;
                }
                if seen.insert(candidate.clone()) {
                    out.push(candidate);
                }
            }
            out
        })
        .prop_filter("not enough distinct keys generated", move |keys| keys.len() == count)
}

/// Key/value pairs with distinct keys, for building a trie and asserting
/// its root hash is independent of insertion order.
pub fn distinct_key_value_pairs(
    key_len: usize,
    value_len: usize,
    count: usize,
) -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    (
        distinct_keys(key_len, count),
        vec(vec(any::<u8>(), value_len), count),
    )
        .prop_map(|(keys, values)| keys.into_iter().zip(values).collect())
}
