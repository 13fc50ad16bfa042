// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! World state: an MPT over `account_id -> account_snapshot_bytes`. A
//! contract's own storage lives in a separate sub-trie, keyed by the same
//! backing store and rooted at `ContractInfo::storage_root`, so touching
//! an account's balance never has to walk its contract's storage.

use bc_crypto::{Address, HashValue};
use bc_failure_ext::Result;
use bc_trie::{Mutable, NodeStore};
use bc_types::account::AccountSnapshot;
use std::sync::Arc;

/// The world state a `Transition`'s execute phase writes into. Unlike
/// `bc_scratchpad::ReadOnlyWorldState`, which a read path shares freely via
/// `Clone`, a `WorldState` is single-owner for the duration of one
/// transition -- only one execute phase is ever live against a given root.
pub struct WorldState {
    store: Arc<dyn NodeStore>,
    accounts: Mutable,
}

impl WorldState {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { accounts: Mutable::new(store.clone()), store }
    }

    pub fn from_root_hash(root_hash: HashValue, store: Arc<dyn NodeStore>) -> Self {
        Self { accounts: Mutable::from_root_hash(root_hash, store.clone()), store }
    }

    pub fn get_account(&self, address: &Address) -> Result<AccountSnapshot> {
        match self.accounts.get(address.as_bytes())? {
            Some(bytes) => AccountSnapshot::decode(&bytes),
            None => Ok(AccountSnapshot::empty()),
        }
    }

    pub fn set_account(&mut self, address: &Address, snapshot: &AccountSnapshot) -> Result<()> {
        self.accounts.set(address.as_bytes(), snapshot.encode())
    }

    pub fn root_hash(&self) -> HashValue {
        self.accounts.root_hash()
    }

    /// Persists every dirty node written since this state was opened and
    /// returns the now-durable root hash. A `Transition`'s execute phase
    /// calls this once, after the last transaction, so the result feeds a
    /// later block's `WorldState::from_root_hash`.
    pub fn flush(&self) -> Result<HashValue> {
        self.accounts.get_snapshot().flush()
    }

    /// Opens the contract-storage sub-trie rooted at `storage_root`,
    /// sharing this world state's backing store. Callers write the
    /// resulting root back into the owning account's `ContractInfo`.
    pub fn contract_storage(&self, storage_root: HashValue) -> Mutable {
        Mutable::from_root_hash(storage_root, self.store.clone())
    }
}
