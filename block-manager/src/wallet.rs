// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The local signing identity `BlockManager::propose` uses to stamp an
//! assembled block. Signing math itself belongs to `bc_crypto`; this trait
//! is the seam a node wires a concrete key (or, eventually, a remote
//! signer) through without the block manager depending on any one scheme.

use bc_crypto::{Address, HashValue, PrivateKey, Signature};
use bc_failure_ext::Result;

pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;
    fn sign(&self, hash: &HashValue) -> Result<Signature>;
}

/// A wallet backed directly by an in-process private key.
pub struct LocalWallet(PrivateKey);

impl LocalWallet {
    pub fn new(key: PrivateKey) -> Self {
        Self(key)
    }
}

impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.0.address()
    }

    fn sign(&self, hash: &HashValue) -> Result<Signature> {
        self.0.sign(hash)
    }
}
