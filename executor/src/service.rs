// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `Service`: the seam a block manager calls through to obtain the patch
//! transactions (admin/system transactions applied before a block's normal
//! transactions) for a given parent. No concrete source of patch
//! transactions is modeled here -- `NoPatches` is the only implementation
//! this workspace ships, and a block manager built against a node that
//! never issues admin transactions can use it directly.

use bc_types::transaction::TransactionList;

pub trait Service: Send + Sync {
    /// Transactions to apply before `normal_txs` when building a child of
    /// the block whose `result` is `parent_result`.
    fn get_patches(&self, parent_result: &[u8]) -> TransactionList;
}

pub struct NoPatches;

impl Service for NoPatches {
    fn get_patches(&self, _parent_result: &[u8]) -> TransactionList {
        TransactionList::default()
    }
}
