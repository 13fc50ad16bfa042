// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The per-account cache overlay a read-only world state sits on top of:
//! a trie snapshot plus a lazily-populated, mutex-guarded cache of
//! decoded `AccountSnapshot`s, so repeated reads of the same account
//! during a transaction's execution don't re-decode the trie leaf value
//! every time.

use bc_crypto::{Address, HashValue};
use bc_failure_ext::Result;
use bc_trie::Snapshot;
use bc_types::AccountSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An immutable view of world state at a fixed root, with a cache of
/// accounts already decoded from the trie. Cheap to clone (an `Arc`
/// around the cache and the trie snapshot's own cheap clone), so a
/// `Transition` can hand copies of the same underlying cache to every
/// `CallContext` it spawns.
#[derive(Clone)]
pub struct ReadOnlyWorldState {
    inner: Arc<Inner>,
}

struct Inner {
    snapshot: Snapshot,
    cache: Mutex<HashMap<Address, Arc<AccountSnapshot>>>,
}

impl ReadOnlyWorldState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { inner: Arc::new(Inner { snapshot, cache: Mutex::new(HashMap::new()) }) }
    }

    pub fn root_hash(&self) -> HashValue {
        self.inner.snapshot.root_hash()
    }

    /// Returns the account's snapshot, populating the cache on first
    /// access. An address with no trie entry yet reads as a fresh, empty
    /// account rather than an error.
    pub fn get_account(&self, address: &Address) -> Result<Arc<AccountSnapshot>> {
        let mut cache = self.inner.cache.lock().expect("account cache mutex poisoned");
        if let Some(existing) = cache.get(address) {
            return Ok(existing.clone());
        }
        let loaded = match self.inner.snapshot.get(address.as_bytes())? {
            Some(bytes) => Arc::new(AccountSnapshot::decode(&bytes)?),
            None => Arc::new(AccountSnapshot::empty()),
        };
        cache.insert(*address, loaded.clone());
        Ok(loaded)
    }

    /// Number of accounts the cache currently holds, for tests.
    pub fn cached_account_count(&self) -> usize {
        self.inner.cache.lock().expect("account cache mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;
    use bc_trie::{MemNodeStore, Mutable};
    use primitive_types::U256;

    fn address(seed: u64) -> Address {
        deterministic_private_key(seed).address()
    }

    #[test]
    fn unset_account_reads_as_empty() {
        let trie = Mutable::new(Arc::new(MemNodeStore::new()));
        let world = ReadOnlyWorldState::new(trie.get_snapshot());
        let account = world.get_account(&address(1)).unwrap();
        assert_eq!(*account, AccountSnapshot::empty());
    }

    #[test]
    fn set_account_is_read_back_and_cached_on_first_use() {
        let mut trie = Mutable::new(Arc::new(MemNodeStore::new()));
        let addr = address(1);
        let snapshot = AccountSnapshot { balance: U256::from(50u64), nonce: 1, ..AccountSnapshot::empty() };
        trie.set(addr.as_bytes(), snapshot.encode()).unwrap();
        let world = ReadOnlyWorldState::new(trie.get_snapshot());

        assert_eq!(world.cached_account_count(), 0);
        let loaded = world.get_account(&addr).unwrap();
        assert_eq!(loaded.balance, U256::from(50u64));
        assert_eq!(world.cached_account_count(), 1);

        // Second read hits the cache rather than decoding again.
        let loaded_again = world.get_account(&addr).unwrap();
        assert!(Arc::ptr_eq(&loaded, &loaded_again));
    }

    #[test]
    fn cloning_the_world_state_shares_the_same_cache() {
        let trie = Mutable::new(Arc::new(MemNodeStore::new()));
        let world = ReadOnlyWorldState::new(trie.get_snapshot());
        let addr = address(1);
        world.get_account(&addr).unwrap();

        let clone = world.clone();
        assert_eq!(clone.cached_account_count(), 1);
    }
}
