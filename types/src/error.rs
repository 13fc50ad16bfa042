// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The error kinds a caller of `BlockManager`/`Transition` must be able to
//! match on, as opposed to the catch-all `bc_failure_ext::Error` used for
//! plain argument errors. Validation and execution failures are always
//! reported through one of these variants, never a bare string.

use bc_failure_ext::Fail;

#[derive(Clone, Debug, Fail)]
pub enum BlockManagerError {
    #[fail(display = "unknown or mismatched parent block")]
    BadParent,

    #[fail(display = "vote set failed the quorum or parent-commitment check")]
    BadVoteSet,

    #[fail(display = "invalid transaction: {}", _0)]
    InvalidTransaction(String),

    #[fail(display = "imported block's declared result does not match re-execution")]
    ResultMismatch,

    #[fail(display = "finalize called out of height order")]
    NonContiguous,

    #[fail(display = "persistence failure: {}", _0)]
    StoreIO(String),

    #[fail(display = "call context timed out")]
    Timeout,

    #[fail(display = "executor or handler anomaly: {}", _0)]
    SystemError(String),

    #[fail(display = "operation cancelled")]
    Cancelled,
}

pub type Result<T> = ::std::result::Result<T, BlockManagerError>;
