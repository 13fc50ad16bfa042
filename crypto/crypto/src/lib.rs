// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hashing and signing primitives shared across the workspace: the 32-byte
//! `HashValue` and `CryptoHash` trait used for block/transaction/trie
//! identity, and the secp256k1 address/signature types used to authenticate
//! transactions and proposed blocks.

pub mod hash;
pub mod signing;
pub mod test_utils;

pub use bc_crypto_derive::CryptoHash;
pub use hash::{CryptoHash as CryptoHashTrait, HashValue};
pub use signing::{Address, PrivateKey, PublicKey, Signature};
