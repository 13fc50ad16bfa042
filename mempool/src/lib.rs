// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A FIFO transaction pool: transactions are admitted in arrival order,
//! de-duplicated by hash, and handed out to a block proposer in the same
//! order they arrived. No fee-based reordering, no per-account nonce
//! tracking -- first in, first proposed.

use bc_config::MempoolConfig;
use bc_crypto::HashValue;
use bc_failure_ext::{bail, Result};
use bc_logger::prelude::warn;
use bc_types::transaction::Transaction;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

struct Inner {
    order: VecDeque<Transaction>,
    ids: HashSet<HashValue>,
}

pub struct Mempool {
    config: MempoolConfig,
    inner: Mutex<Inner>,
}

impl Mempool {
    pub fn new(config: MempoolConfig) -> Self {
        Self { config, inner: Mutex::new(Inner { order: VecDeque::new(), ids: HashSet::new() }) }
    }

    /// Admits `tx` at the back of the queue. Rejects a transaction whose
    /// hash is already pending and rejects outright once the pool is at
    /// `capacity`.
    pub fn insert(&self, tx: Transaction) -> Result<()> {
        let id = tx.id();
        let mut inner = self.inner.lock().expect("mempool mutex poisoned");
        if inner.ids.contains(&id) {
            warn!("rejecting duplicate transaction"; "id" => format!("{:?}", id));
            bail!("transaction {:?} already pending", id);
        }
        if inner.order.len() >= self.config.capacity {
            warn!("mempool at capacity, rejecting transaction"; "capacity" => self.config.capacity);
            bail!("mempool at capacity ({})", self.config.capacity);
        }
        inner.ids.insert(id);
        inner.order.push_back(tx);
        Ok(())
    }

    /// Drops a transaction by hash, e.g. once its containing block is
    /// finalized. A no-op if the hash isn't pending.
    pub fn remove(&self, id: &HashValue) {
        let mut inner = self.inner.lock().expect("mempool mutex poisoned");
        if inner.ids.remove(id) {
            inner.order.retain(|tx| tx.id() != *id);
        }
    }

    pub fn contains(&self, id: &HashValue) -> bool {
        self.inner.lock().expect("mempool mutex poisoned").ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("mempool mutex poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `block_tx_limit` pending transactions, oldest first. Does not
    /// remove them -- the caller removes each one explicitly once the
    /// block that included it is finalized, so a block that never commits
    /// (cancelled or superseded) leaves the pool untouched.
    pub fn take_block_transactions(&self) -> Vec<Transaction> {
        let inner = self.inner.lock().expect("mempool mutex poisoned");
        inner.order.iter().take(self.config.block_tx_limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;
    use bc_types::transaction::{RawTransaction, TransactionData};
    use primitive_types::U256;

    fn sample(seed: u64, nonce: u64) -> Transaction {
        let key = deterministic_private_key(seed);
        let raw = RawTransaction {
            version: 1,
            from: key.address(),
            to: None,
            value: U256::zero(),
            step_limit: 1,
            step_price: U256::zero(),
            nonce,
            data: TransactionData::Transfer,
        };
        let signature = key.sign(&raw.hash()).unwrap();
        Transaction { raw, signature }
    }

    #[test]
    fn insert_then_take_preserves_arrival_order() {
        let pool = Mempool::new(MempoolConfig::default());
        let a = sample(1, 0);
        let b = sample(2, 0);
        pool.insert(a.clone()).unwrap();
        pool.insert(b.clone()).unwrap();
        assert_eq!(pool.take_block_transactions(), vec![a, b]);
    }

    #[test]
    fn duplicate_hash_is_rejected() {
        let pool = Mempool::new(MempoolConfig::default());
        let tx = sample(1, 0);
        pool.insert(tx.clone()).unwrap();
        assert!(pool.insert(tx).is_err());
    }

    #[test]
    fn full_pool_rejects_further_inserts() {
        let pool = Mempool::new(MempoolConfig { capacity: 1, block_tx_limit: 10 });
        pool.insert(sample(1, 0)).unwrap();
        assert!(pool.insert(sample(2, 0)).is_err());
    }

    #[test]
    fn block_tx_limit_caps_what_take_returns() {
        let pool = Mempool::new(MempoolConfig { capacity: 10, block_tx_limit: 1 });
        pool.insert(sample(1, 0)).unwrap();
        pool.insert(sample(2, 0)).unwrap();
        assert_eq!(pool.take_block_transactions().len(), 1);
    }

    #[test]
    fn remove_drops_a_pending_transaction() {
        let pool = Mempool::new(MempoolConfig::default());
        let tx = sample(1, 0);
        pool.insert(tx.clone()).unwrap();
        pool.remove(&tx.id());
        assert!(!pool.contains(&tx.id()));
        assert!(pool.is_empty());
    }

    #[test]
    fn removing_an_absent_hash_is_a_no_op() {
        let pool = Mempool::new(MempoolConfig::default());
        pool.remove(&HashValue::zero());
        assert!(pool.is_empty());
    }
}
