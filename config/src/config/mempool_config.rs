// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MempoolConfig {
    // Maximum number of pending transactions the pool holds at once.
    pub capacity: usize,
    // Maximum number of normal transactions Propose draws from the pool
    // for a single block.
    pub block_tx_limit: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self { capacity: 10_000, block_tx_limit: 1_000 }
    }
}
