// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The trie is store-agnostic: it only needs somewhere to resolve a node
//! hash back into its canonical encoding, and somewhere to write new
//! encodings on `Flush`. `storage/schemadb` and `executor`'s world state
//! plug in a real backing store; `MemNodeStore` here is what the trie's
//! own unit and property tests run against.

use bc_crypto::HashValue;
use bc_failure_ext::Result;
use std::collections::HashMap;
use std::sync::Mutex;

pub trait NodeStore: Send + Sync {
    fn get(&self, hash: &HashValue) -> Result<Option<Vec<u8>>>;
    fn put(&self, hash: HashValue, encoding: Vec<u8>);
}

#[derive(Default)]
pub struct MemNodeStore {
    nodes: Mutex<HashMap<HashValue, Vec<u8>>>,
}

impl MemNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().expect("node store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeStore for MemNodeStore {
    fn get(&self, hash: &HashValue) -> Result<Option<Vec<u8>>> {
        Ok(self.nodes.lock().expect("node store mutex poisoned").get(hash).cloned())
    }

    fn put(&self, hash: HashValue, encoding: Vec<u8>) {
        self.nodes.lock().expect("node store mutex poisoned").insert(hash, encoding);
    }
}
