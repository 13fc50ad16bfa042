// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A `Db` backed by the real `rocksdb` crate, gated behind the
//! `rocksdb-backend` feature so the workspace builds without a system
//! RocksDB install unless a caller opts in.

use crate::Db;
use bc_failure_ext::{format_err, Result};
use bc_logger::prelude::info;
use std::path::Path;

pub struct RocksDb {
    inner: rocksdb::DB,
}

impl RocksDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut options = rocksdb::Options::default();
        options.create_if_missing(true);
        let inner = rocksdb::DB::open(&options, path.as_ref())
            .map_err(|e| format_err!("failed to open rocksdb at {:?}: {}", path.as_ref(), e))?;
        info!("opened rocksdb store"; "path" => format!("{:?}", path.as_ref()));
        Ok(Self { inner })
    }
}

impl Db for RocksDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner
            .get(key)
            .map_err(|e| format_err!("rocksdb get failed: {}", e))
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.inner
            .put(key, value)
            .map_err(|e| format_err!("rocksdb put failed: {}", e))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner
            .delete(key)
            .map_err(|e| format_err!("rocksdb delete failed: {}", e))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        let iter = self.inner.prefix_iterator(prefix);
        for item in iter {
            let (key, value) = item.map_err(|e| format_err!("rocksdb iterator failed: {}", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}
