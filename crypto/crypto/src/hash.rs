// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! 32-byte SHA3-256 hash values, used for trie node hashes, block hashes
//! and transaction/receipt hashes alike.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::convert::TryFrom;
use std::fmt;

pub const HASH_LENGTH: usize = 32;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct HashValue([u8; HASH_LENGTH]);

impl HashValue {
    pub const fn zero() -> Self {
        Self([0u8; HASH_LENGTH])
    }

    pub fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Hashes `bytes` directly, with no domain separation. Used by the
    /// trie, whose node encodings are already self-describing, and by
    /// anything deriving `CryptoHash` over a domain-separated preimage.
    pub fn sha3_256_of(bytes: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }
}

impl TryFrom<&[u8]> for HashValue {
    type Error = bc_failure_ext::Error;

    fn try_from(bytes: &[u8]) -> bc_failure_ext::Result<Self> {
        bc_failure_ext::ensure!(
            bytes.len() == HASH_LENGTH,
            "hash value must be {} bytes, got {}",
            HASH_LENGTH,
            bytes.len()
        );
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Implemented by every type that gets a stable, domain-separated hash
/// identity: blocks, transactions, receipts, validator lists. Derive it
/// with `#[derive(bc_crypto_derive::CryptoHash)]` rather than hand-rolling
/// the domain-separator string.
pub trait CryptoHash {
    fn hash(&self) -> HashValue;
}
