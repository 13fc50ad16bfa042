// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Thin wrapper around the `failure` crate, matching how the rest of the
//! workspace wants to handle errors: a single `Result` alias, the
//! `ensure!`/`bail!`/`format_err!` macros re-exported at the crate root, and
//! a `ResultExt::with_context` extension used throughout `block-manager` and
//! `executor` to attach a human-readable operation name to a propagated
//! error.

pub use bc_failure_macros::ensure_eq;
pub use failure::{bail, ensure, format_err, Error, Fail, ResultExt};

/// The `Result` alias used across the workspace for operations whose error
/// kind the caller doesn't need to match on (argument errors, I/O, etc).
/// Operations whose callers must distinguish failure kinds (see spec §7)
/// return a specific `Fail` enum instead, e.g. `BlockManagerError`.
pub type Result<T> = ::std::result::Result<T, Error>;
