// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The value side of the world-state trie: `account_id -> account_snapshot`.
//! Contract state itself lives in a separate sub-trie, rooted at
//! `ContractInfo::storage_root`, so an account's own entry stays small
//! regardless of how much storage its contract holds.

use bc_crypto::{Address, HashValue};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub code: Vec<u8>,
    /// Opaque blob returned by the executor's `GetAPI`, cached so repeated
    /// calls don't need to round-trip to the executor.
    pub api_info: Vec<u8>,
    pub storage_root: HashValue,
    pub owner: Address,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: U256,
    pub nonce: u64,
    /// The contract currently live for this account, if any.
    pub current_contract: Option<ContractInfo>,
    /// A `Deploy`-staged contract awaiting its `Accept` handler's
    /// `on_install`/`on_update` before it is promoted to `current_contract`.
    pub next_contract: Option<ContractInfo>,
}

impl AccountSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_contract(&self) -> bool {
        self.current_contract.is_some()
    }

    pub fn encode(&self) -> Vec<u8> {
        bc_lcs::to_bytes(self).expect("an account snapshot always encodes")
    }

    pub fn decode(bytes: &[u8]) -> bc_failure_ext::Result<Self> {
        bc_lcs::from_bytes(bytes).map_err(|e| bc_failure_ext::format_err!("malformed account snapshot: {}", e))
    }
}
