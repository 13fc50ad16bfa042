// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The persisted key layout: one flat keyspace, partitioned by prefix
//! rather than by column family, matching the layout `spec.md` section 6
//! spells out. Keeping every prefix-building function in one place means
//! a reviewer can check the whole on-disk schema at a glance.

use bc_crypto::HashValue;

pub fn block_by_height(height: u64) -> Vec<u8> {
    let mut key = b"block_by_height/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn block_header(id: &HashValue) -> Vec<u8> {
    prefixed(b"block_header/", id)
}

pub fn block_body(id: &HashValue) -> Vec<u8> {
    prefixed(b"block_body/", id)
}

pub fn tx_list(hash: &HashValue) -> Vec<u8> {
    prefixed(b"tx_list/", hash)
}

pub fn receipts(hash: &HashValue) -> Vec<u8> {
    prefixed(b"receipts/", hash)
}

pub fn state(hash: &HashValue) -> Vec<u8> {
    prefixed(b"state/", hash)
}

/// The world-state trie root a finalized block's transition left behind,
/// keyed by the block's id. Distinct from `state/<hash>`, which addresses
/// individual trie nodes: this is the one root a later `Propose`/`Import`
/// needs to reopen `WorldState::from_root_hash` for that block's child.
pub fn state_root(id: &HashValue) -> Vec<u8> {
    prefixed(b"state_root/", id)
}

pub fn last_block() -> Vec<u8> {
    b"last_block".to_vec()
}

fn prefixed(prefix: &[u8], hash: &HashValue) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend_from_slice(hash.as_bytes());
    key
}
