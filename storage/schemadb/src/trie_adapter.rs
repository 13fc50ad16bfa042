// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapts any `Db` into a `bc_trie::NodeStore` over the `state/<hash>`
//! prefix, so the world-state trie persists through the same store as
//! everything else rather than needing a bespoke backing store of its own.

use crate::{keys, Db};
use bc_crypto::HashValue;
use bc_trie::NodeStore;
use std::sync::Arc;

pub struct TrieNodeStore {
    db: Arc<dyn Db>,
}

impl TrieNodeStore {
    pub fn new(db: Arc<dyn Db>) -> Self {
        Self { db }
    }
}

impl NodeStore for TrieNodeStore {
    fn get(&self, hash: &HashValue) -> bc_failure_ext::Result<Option<Vec<u8>>> {
        self.db.get(&keys::state(hash))
    }

    fn put(&self, hash: HashValue, encoding: Vec<u8>) {
        // `Db::put` only fails on a real I/O error; `NodeStore::put`
        // has no way to surface one since `Snapshot::flush` treats
        // persistence of an individual node as infallible once the
        // encoding is known. A failure here indicates `StoreIO`, which
        // `Flush`'s caller (the block manager, during Finalize) must
        // already be prepared to treat as fatal.
        if let Err(err) = self.db.put(keys::state(&hash), encoding) {
            bc_logger::prelude::error!("failed to persist trie node"; "hash" => %hash, "error" => %err);
        }
    }
}
