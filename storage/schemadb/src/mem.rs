// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::Db;
use bc_failure_ext::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory `Db`, backed by a `BTreeMap` so `scan_prefix` returns keys
/// in sorted order the same way a real LSM-tree store would. Used by
/// every crate's tests and by `bc-node` when run without
/// `rocksdb-backend`.
#[derive(Default)]
pub struct MemDb {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Db for MemDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().expect("db mutex poisoned").get(key).cloned())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.entries.lock().expect("db mutex poisoned").insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.entries.lock().expect("db mutex poisoned").remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .lock()
            .expect("db mutex poisoned")
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_prefix_returns_only_matching_keys_in_order() {
        let db = MemDb::new();
        db.put(b"a/1".to_vec(), b"v1".to_vec()).unwrap();
        db.put(b"a/2".to_vec(), b"v2".to_vec()).unwrap();
        db.put(b"b/1".to_vec(), b"v3".to_vec()).unwrap();

        let results = db.scan_prefix(b"a/").unwrap();
        assert_eq!(
            results,
            vec![(b"a/1".to_vec(), b"v1".to_vec()), (b"a/2".to_vec(), b"v2".to_vec())]
        );
    }

    #[test]
    fn delete_removes_the_key() {
        let db = MemDb::new();
        db.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        db.delete(b"k").unwrap();
        assert_eq!(db.get(b"k").unwrap(), None);
    }
}
