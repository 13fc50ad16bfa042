// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared plumbing behind every content-addressed sequence in this crate
//! (`TransactionList`, a block's receipts, `ValidatorList`): build an
//! ephemeral trie keyed by the big-endian index of each element and take
//! its root hash. The trie itself is never kept around -- only the root
//! is observable to callers, so there is no reason to persist the nodes.

use bc_crypto::HashValue;
use bc_trie::{MemNodeStore, Mutable};
use std::sync::Arc;

/// Computes the Merkle-Patricia root over `index -> encoding`, in the
/// order `encodings` is given (which is always index order for callers in
/// this crate).
pub(crate) fn root_over(encodings: impl Iterator<Item = Vec<u8>>) -> HashValue {
    let mut trie = Mutable::new(Arc::new(MemNodeStore::new()));
    for (index, encoding) in encodings.enumerate() {
        trie.set(&index_key(index as u64), encoding)
            .expect("an in-memory node store never fails a set");
    }
    trie.root_hash()
}

fn index_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}
