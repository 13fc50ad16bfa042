// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A minimal key-value store abstraction over the persisted chain state:
//! one flat keyspace partitioned by the prefixes `keys` defines, an
//! in-memory implementation for tests, and an optional `rocksdb`-backed
//! one for a real node.

pub mod keys;
mod mem;
#[cfg(feature = "rocksdb-backend")]
mod rocks;
mod trie_adapter;

pub use mem::MemDb;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksDb;
pub use trie_adapter::TrieNodeStore;

use bc_failure_ext::Result;

/// The storage interface every persisted subsystem (block headers and
/// bodies, transaction/receipt bundles, world-state trie nodes) is
/// written against. Implementations must be safe to share across the
/// block-processor thread and any reader threads.
pub trait Db: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;
    fn delete(&self, key: &[u8]) -> Result<()>;
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::HashValue;
    use std::sync::Arc;

    #[test]
    fn trie_node_store_round_trips_through_the_state_prefix() {
        let db = Arc::new(MemDb::new());
        let store = TrieNodeStore::new(db.clone());
        let hash = HashValue::sha3_256_of(b"a node encoding");
        store.put(hash, b"a node encoding".to_vec());

        assert_eq!(
            db.get(&keys::state(&hash)).unwrap().as_deref(),
            Some(&b"a node encoding"[..])
        );
        use bc_trie::NodeStore;
        assert_eq!(store.get(&hash).unwrap().as_deref(), Some(&b"a node encoding"[..]));
    }
}
