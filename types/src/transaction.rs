// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Transactions and the content-addressed lists they're batched into. A
//! transaction's signature is over the hash of everything but the
//! signature itself (`RawTransaction`), the same shape as the block
//! header/signature split in `block.rs`.

use crate::merkle_list;
use crate::validator::ValidatorList;
use bc_crypto::{Address, CryptoHashTrait, HashValue, Signature};
use bc_crypto_derive::CryptoHash;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionData {
    Transfer,
    Deploy { code: Vec<u8> },
    Call { method: String, params: Vec<u8> },
    /// Scheduled by the block's own `Deploy` handler; not submitted
    /// directly by a user wallet.
    Accept { deploy_tx_hash: HashValue },
    /// An admin-originated patch transaction; the only way
    /// `next_validators` changes between blocks.
    Patch { next_validators: Option<ValidatorList> },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, CryptoHash)]
pub struct RawTransaction {
    pub version: u32,
    pub from: Address,
    pub to: Option<Address>,
    pub value: primitive_types::U256,
    pub step_limit: u64,
    pub step_price: primitive_types::U256,
    pub nonce: u64,
    pub data: TransactionData,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, CryptoHash)]
pub struct Transaction {
    pub raw: RawTransaction,
    pub signature: Signature,
}

impl Transaction {
    /// The hash used for de-duplication and as the trie key in a
    /// `TransactionList`/`ReceiptList` pairing and for the `Accept`
    /// handler's back-reference to the `Deploy` transaction that scheduled
    /// it.
    pub fn id(&self) -> HashValue {
        CryptoHashTrait::hash(self)
    }

    pub fn verify_signature(&self) -> bool {
        matches!(
            self.signature.recover_address(&self.raw.hash()),
            Ok(address) if address == self.raw.from
        )
    }

    pub fn is_patch(&self) -> bool {
        matches!(self.raw.data, TransactionData::Patch { .. })
    }

    /// Accounts a handler for this transaction will need a write lock on,
    /// in no particular order -- the caller (the `Transition`'s execute
    /// phase) is responsible for coalescing and sorting across a whole
    /// block before acquiring anything.
    pub fn touched_accounts(&self) -> Vec<Address> {
        let mut accounts = vec![self.raw.from];
        if let Some(to) = self.raw.to {
            accounts.push(to);
        }
        accounts
    }
}

/// A content-addressed, ordered sequence of transactions. Two lists with
/// the same elements in the same order hash equal.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionList {
    transactions: Vec<Transaction>,
}

impl TransactionList {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn hash(&self) -> HashValue {
        merkle_list::root_over(
            self.transactions.iter().map(|tx| bc_lcs::to_bytes(tx).expect("a transaction always encodes")),
        )
    }
}

impl<'a> IntoIterator for &'a TransactionList {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;
    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;
    use primitive_types::U256;

    fn sample_transaction(seed: u64, nonce: u64) -> Transaction {
        let key = deterministic_private_key(seed);
        let raw = RawTransaction {
            version: 1,
            from: key.address(),
            to: None,
            value: U256::zero(),
            step_limit: 1_000_000,
            step_price: U256::from(1),
            nonce,
            data: TransactionData::Transfer,
        };
        let signature = key.sign(&raw.hash()).unwrap();
        Transaction { raw, signature }
    }

    #[test]
    fn signature_verifies_against_the_declared_sender() {
        let tx = sample_transaction(1, 0);
        assert!(tx.verify_signature());
    }

    #[test]
    fn tampered_raw_fails_signature_verification() {
        let mut tx = sample_transaction(1, 0);
        tx.raw.nonce += 1;
        assert!(!tx.verify_signature());
    }

    #[test]
    fn two_lists_with_the_same_transactions_hash_equal() {
        let list_a = TransactionList::new(vec![sample_transaction(1, 0), sample_transaction(2, 0)]);
        let list_b = TransactionList::new(vec![sample_transaction(1, 0), sample_transaction(2, 0)]);
        assert_eq!(list_a.hash(), list_b.hash());
    }

    #[test]
    fn reordering_transactions_changes_the_hash() {
        let list_a = TransactionList::new(vec![sample_transaction(1, 0), sample_transaction(2, 0)]);
        let list_b = TransactionList::new(vec![sample_transaction(2, 0), sample_transaction(1, 0)]);
        assert_ne!(list_a.hash(), list_b.hash());
    }
}
