// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! One receipt per executed transaction, and the content-addressed list
//! they're bundled into -- a `ReceiptList`'s hash is one of the three
//! components folded into a block's `result`.

use crate::merkle_list;
use crate::status::StatusCode;
use bc_crypto::{Address, HashValue};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: StatusCode,
    pub step_used: u64,
    /// The contract address a `Deploy`/`Call` touched, if any.
    pub score_address: Option<Address>,
    /// Opaque event-log bytes emitted by the handler; folded into the
    /// block's `log_bloom` by the execute phase.
    pub logs: Vec<u8>,
}

impl Receipt {
    pub fn success(step_used: u64) -> Self {
        Self { status: StatusCode::SUCCESS, step_used, score_address: None, logs: Vec::new() }
    }

    pub fn failure(status: StatusCode, step_used: u64) -> Self {
        debug_assert!(!status.is_success());
        Self { status, step_used, score_address: None, logs: Vec::new() }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReceiptList {
    receipts: Vec<Receipt>,
}

impl ReceiptList {
    pub fn new(receipts: Vec<Receipt>) -> Self {
        Self { receipts }
    }

    pub fn as_slice(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Receipt> {
        self.receipts.iter()
    }

    pub fn hash(&self) -> HashValue {
        merkle_list::root_over(
            self.receipts.iter().map(|r| bc_lcs::to_bytes(r).expect("a receipt always encodes")),
        )
    }
}
