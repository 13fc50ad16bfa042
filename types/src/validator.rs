// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The validator set a block's votes must commit against, and that a
//! successful execution may replace for the next height.

use crate::merkle_list;
use bc_crypto::{Address, HashValue};
use serde::{Deserialize, Serialize};

/// An ordered, deduplicated set of validator addresses. Two lists with the
/// same members in the same order are equal and hash equal; construction
/// silently drops repeats rather than rejecting them; the common case is
/// the genesis validator set which is expected to be distinct already.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidatorList {
    validators: Vec<Address>,
}

impl ValidatorList {
    pub fn new(validators: impl IntoIterator<Item = Address>) -> Self {
        let mut out = Vec::new();
        for address in validators {
            if !out.contains(&address) {
                out.push(address);
            }
        }
        Self { validators: out }
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.validators.contains(address)
    }

    /// The trie root over `index -> address`, used as `next_validators_hash`
    /// in a block header.
    pub fn hash(&self) -> HashValue {
        merkle_list::root_over(self.validators.iter().map(|a| a.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;

    fn addr(seed: u64) -> Address {
        deterministic_private_key(seed).address()
    }

    #[test]
    fn deduplicates_while_preserving_first_occurrence_order() {
        let a = addr(1);
        let b = addr(2);
        let list = ValidatorList::new(vec![a, b, a]);
        assert_eq!(list.as_slice(), &[a, b]);
    }

    #[test]
    fn equal_membership_and_order_hashes_equal() {
        let a = addr(1);
        let b = addr(2);
        let x = ValidatorList::new(vec![a, b]);
        let y = ValidatorList::new(vec![a, b]);
        assert_eq!(x.hash(), y.hash());
    }

    #[test]
    fn different_order_hashes_differently() {
        let a = addr(1);
        let b = addr(2);
        let x = ValidatorList::new(vec![a, b]);
        let y = ValidatorList::new(vec![b, a]);
        assert_ne!(x.hash(), y.hash());
    }
}
