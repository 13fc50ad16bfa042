// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A Merkle-Patricia Trie: the content-addressed, canonically-hashed
//! key/value structure backing world state, transaction lists, receipt
//! lists and validator lists.
//!
//! A node is one of three kinds -- `Leaf`, `Branch` (16 children plus an
//! optional value) and `Extension` (a shared nibble prefix collapsing a
//! chain of single-child branches) -- encoded canonically and hashed with
//! SHA3-256. `Mutable` is the trie a caller writes into; `Snapshot` is the
//! cheap, thread-safe, immutable commitment `Mutable::get_snapshot`
//! produces, which `Snapshot::flush` later persists.

mod codec;
mod node;
mod store;
mod trie;

pub use node::{ChildRef, Link, Node};
pub use store::{MemNodeStore, NodeStore};
pub use trie::{Mutable, Snapshot};
