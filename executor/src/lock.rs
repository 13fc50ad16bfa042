// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-account locking for a `Transition`'s execute phase. Each handler
//! declares the accounts it touches as a `LockRequest`; the execute phase
//! coalesces every transaction's requests across the whole block and
//! acquires them in sorted address order before running any handler,
//! releasing them only after the block's receipts are recorded -- this is
//! what prevents deadlock across concurrently-dispatched async frames and
//! gives the block serializable semantics.

use bc_crypto::Address;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockMode {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockRequest {
    pub account: Address,
    pub mode: LockMode,
}

/// Owns one mutex per account ever touched by a `LockTable`'s lifetime.
/// Accounts are added lazily on first request; the table itself only ever
/// grows, since a `Transition` is short-lived (one block) and accounts are
/// cheap to key by address.
#[derive(Default)]
pub struct LockTable {
    locks: Mutex<BTreeMap<Address, Arc<Mutex<()>>>>,
}

/// The held locks for one coalesced acquisition. Dropping it releases
/// every lock. Guards are `Arc`-owning (`lock_arc`) rather than borrowing
/// from `LockTable`, so a `LockGuardSet` can outlive the call that created
/// it without tying up a lifetime parameter.
pub struct LockGuardSet {
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires every distinct account named in `requests`, sorted by
    /// address so two coalesced acquisitions (e.g. two transactions in the
    /// same block whose touched accounts overlap) can never deadlock
    /// against each other.
    pub fn acquire(&self, requests: &[LockRequest]) -> LockGuardSet {
        let mut accounts: Vec<Address> = requests.iter().map(|r| r.account).collect();
        accounts.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        accounts.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock();
            accounts
                .iter()
                .map(|address| locks.entry(*address).or_insert_with(|| Arc::new(Mutex::new(()))).clone())
                .collect()
        };

        let guards = mutexes.into_iter().map(|mutex| mutex.lock_arc()).collect();
        LockGuardSet { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;

    #[test]
    fn overlapping_requests_deduplicate_to_one_lock_per_account() {
        let table = LockTable::new();
        let address = deterministic_private_key(1).address();
        let requests =
            vec![LockRequest { account: address, mode: LockMode::Write }, LockRequest { account: address, mode: LockMode::Read }];
        let _guards = table.acquire(&requests);
    }

    #[test]
    fn disjoint_accounts_can_be_locked_concurrently_from_different_tables() {
        let table = LockTable::new();
        let a = deterministic_private_key(1).address();
        let b = deterministic_private_key(2).address();
        let first = table.acquire(&[LockRequest { account: a, mode: LockMode::Write }]);
        let second = table.acquire(&[LockRequest { account: b, mode: LockMode::Write }]);
        drop(first);
        drop(second);
    }

    #[test]
    fn acquiring_the_same_account_again_after_drop_does_not_deadlock() {
        let table = LockTable::new();
        let a = deterministic_private_key(1).address();
        let first = table.acquire(&[LockRequest { account: a, mode: LockMode::Write }]);
        drop(first);
        let _second = table.acquire(&[LockRequest { account: a, mode: LockMode::Write }]);
    }
}
