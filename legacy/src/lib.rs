// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only verification for Block V1, the wire format this chain used
//! before the current `bc_types::block::Block` layout. Nothing here is
//! reused by the canonical block path -- a V1 block can be checked for
//! validity (e.g. while importing an old chain segment) but never
//! produced or re-encoded.

use bc_crypto::{HashValue, Signature};
use bc_failure_ext::{ensure, format_err, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// A Block V1 record, decoded directly from its JSON wire shape. Every
/// hash/signature field arrives hex-encoded (optionally `0x`-prefixed);
/// `prev_block_hash` and `merkle_tree_root_hash` are kept as the original
/// strings because `verify` hashes their ASCII form, not their decoded
/// bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockV1 {
    pub version: String,
    pub prev_block_hash: String,
    pub merkle_tree_root_hash: String,
    pub confirmed_transaction_list: Vec<serde_json::Value>,
    pub block_hash: String,
    pub height: i64,
    pub peer_id: String,
    pub time_stamp: u64,
    pub signature: String,
}

impl BlockV1 {
    pub fn parse(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Checks `block_hash`, the proposer signature (for every height but
    /// genesis) and the merkle root over `confirmed_transaction_list`, in
    /// that order. The first failing check is reported; later checks are
    /// not attempted.
    pub fn verify(&self) -> Result<()> {
        let computed = self.compute_block_hash();
        let declared = decode_hex(&self.block_hash)?;
        ensure!(
            computed.as_bytes().as_slice() == declared.as_slice(),
            "block hash mismatch: recorded {}, computed {}",
            self.block_hash,
            computed
        );

        if self.height > 0 {
            let signature = Signature::from_bytes(&decode_hex(&self.signature)?)?;
            let signer = signature.recover_address(&computed)?;
            let signer_id = format!("{}", signer);
            ensure!(
                signer_id == self.peer_id,
                "signer {} does not match declared peer_id {}",
                signer_id,
                self.peer_id
            );
        }

        let merkle_root = self.compute_merkle_root()?;
        let declared_root = decode_hex(&self.merkle_tree_root_hash)?;
        ensure!(
            merkle_root.as_bytes().as_slice() == declared_root.as_slice(),
            "merkle tree root mismatch: recorded {}, computed {}",
            self.merkle_tree_root_hash,
            merkle_root
        );

        Ok(())
    }

    fn compute_block_hash(&self) -> HashValue {
        let mut bytes = Vec::with_capacity(self.prev_block_hash.len() + self.merkle_tree_root_hash.len() + 8);
        bytes.extend_from_slice(self.prev_block_hash.as_bytes());
        bytes.extend_from_slice(self.merkle_tree_root_hash.as_bytes());
        let mut ts = [0u8; 8];
        LittleEndian::write_u64(&mut ts, self.time_stamp);
        bytes.extend_from_slice(&ts);
        HashValue::sha3_256_of(&bytes)
    }

    fn compute_merkle_root(&self) -> Result<HashValue> {
        let mut trie = bc_trie::Mutable::new(std::sync::Arc::new(bc_trie::MemNodeStore::new()));
        for (index, tx) in self.confirmed_transaction_list.iter().enumerate() {
            let encoded = serde_json::to_vec(tx).map_err(|e| format_err!("malformed confirmed transaction: {}", e))?;
            trie.set(&(index as u64).to_be_bytes(), encoded)?;
        }
        Ok(trie.root_hash())
    }
}

fn decode_hex(field: &str) -> Result<Vec<u8>> {
    let trimmed = field.strip_prefix("0x").unwrap_or(field);
    hex::decode(trimmed).map_err(|e| format_err!("malformed hex field {:?}: {}", field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;

    fn hexify(bytes: &[u8]) -> String {
        format!("0x{}", hex::encode(bytes))
    }

    fn signed_block_v1(height: i64) -> (BlockV1, bc_crypto::PrivateKey) {
        let proposer = deterministic_private_key(7);
        let prev_block_hash = hexify(HashValue::sha3_256_of(b"prev").as_bytes());
        let confirmed_transaction_list = vec![serde_json::json!({"from": "hx0", "value": "0x1"})];
        let encoded = serde_json::to_vec(&confirmed_transaction_list[0]).unwrap();
        let mut trie = bc_trie::Mutable::new(std::sync::Arc::new(bc_trie::MemNodeStore::new()));
        trie.set(&0u64.to_be_bytes(), encoded).unwrap();
        let merkle_tree_root_hash = hexify(trie.root_hash().as_bytes());
        let time_stamp = 1_600_000_000u64;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(prev_block_hash.as_bytes());
        bytes.extend_from_slice(merkle_tree_root_hash.as_bytes());
        let mut ts = [0u8; 8];
        LittleEndian::write_u64(&mut ts, time_stamp);
        bytes.extend_from_slice(&ts);
        let block_hash = HashValue::sha3_256_of(&bytes);

        let signature = proposer.sign(&block_hash).unwrap();
        let peer_id = if height > 0 { format!("{}", proposer.address()) } else { "hx0".to_string() };

        (
            BlockV1 {
                version: "0x3".to_string(),
                prev_block_hash,
                merkle_tree_root_hash,
                confirmed_transaction_list,
                block_hash: hexify(block_hash.as_bytes()),
                height,
                peer_id,
                time_stamp,
                signature: hexify(signature.as_bytes()),
            },
            proposer,
        )
    }

    #[test]
    fn well_formed_block_verifies() {
        let (block, _proposer) = signed_block_v1(10);
        block.verify().unwrap();
    }

    #[test]
    fn genesis_skips_the_signer_check() {
        let (block, _proposer) = signed_block_v1(0);
        block.verify().unwrap();
    }

    #[test]
    fn tampered_block_hash_is_rejected() {
        let (mut block, _proposer) = signed_block_v1(5);
        block.block_hash = hexify(HashValue::sha3_256_of(b"not the real hash").as_bytes());
        assert!(block.verify().is_err());
    }

    #[test]
    fn signature_from_a_different_key_is_rejected() {
        let (mut block, _proposer) = signed_block_v1(5);
        let impostor = deterministic_private_key(8);
        let computed = block.compute_block_hash();
        block.signature = hexify(impostor.sign(&computed).unwrap().as_bytes());
        assert!(block.verify().is_err());
    }

    #[test]
    fn tampered_transaction_list_changes_the_merkle_root() {
        let (mut block, _proposer) = signed_block_v1(5);
        block.confirmed_transaction_list.push(serde_json::json!({"from": "hx1", "value": "0x2"}));
        assert!(block.verify().is_err());
    }

    #[test]
    fn parse_round_trips_through_json() {
        let (block, _proposer) = signed_block_v1(3);
        let json = serde_json::to_vec(&block).unwrap();
        let parsed = BlockV1::parse(&json).unwrap();
        parsed.verify().unwrap();
    }
}
