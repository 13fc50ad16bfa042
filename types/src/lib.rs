// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core chain data types: blocks, transactions, votes, validators, receipts,
//! account snapshots, and the error kinds a `BlockManager`/`Transition`
//! caller matches on. Hashing and content-addressing for everything here
//! goes through `bc_crypto`/`bc_lcs`; the one exception is `Block`'s wire
//! encoding, which is a fixed byte layout rather than generic LCS (see
//! `block.rs`).

pub mod account;
pub mod block;
pub mod error;
mod merkle_list;
pub mod receipt;
pub mod status;
pub mod transaction;
pub mod validator;
pub mod vote;

pub use account::{AccountSnapshot, ContractInfo};
pub use block::Block;
pub use error::BlockManagerError;
pub use receipt::{Receipt, ReceiptList};
pub use status::StatusCode;
pub use transaction::{RawTransaction, Transaction, TransactionData, TransactionList};
pub use validator::ValidatorList;
pub use vote::{Vote, VoteSet};
