// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured logging for the node, built on `slog`. Every crate in the
//! workspace logs through `bc_logger::prelude::{info, debug, warn, error}`,
//! which resolve against the thread-local / global logger installed by
//! [`set_global_logger`] rather than a crate-local instance -- this is what
//! lets a `ContractHandler`'s `ResetLogger(logger)` swap the logger a whole
//! call tree writes to without threading a `Logger` argument through every
//! function.

use lazy_static::lazy_static;
use slog::{o, Drain};
use std::sync::Mutex;

pub mod prelude {
    pub use slog_scope::{crit, debug, error, info, trace, warn};
}

pub use slog::Logger;

lazy_static! {
    static ref GUARD: Mutex<Option<slog_scope::GlobalLoggerGuard>> = Mutex::new(None);
}

/// Builds the default terminal logger: async, compact-format, draining to
/// stderr. Matches the teacher's logger defaults (async drain so a slow
/// terminal never blocks the block-processing thread).
pub fn term_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}

/// Installs `logger` as the process-wide logger that `prelude` macros write
/// to. Safe to call more than once (e.g. from multiple `#[test]`s in the
/// same binary); the previous guard is simply dropped.
pub fn set_global_logger(logger: Logger) {
    let guard = slog_scope::set_global_logger(logger);
    *GUARD.lock().expect("logger guard mutex poisoned") = Some(guard);
}

/// Convenience for tests and examples: installs a terminal logger if one
/// isn't already active.
pub fn init_for_testing() {
    if GUARD.lock().expect("logger guard mutex poisoned").is_none() {
        set_global_logger(term_logger());
    }
}

/// Returns a logger scoped under the given component name, inheriting the
/// currently-installed global logger's drain. `CallContext`/`ContractHandler`
/// use this to tag every line with which handler emitted it.
pub fn named(component: &'static str) -> Logger {
    slog_scope::logger().new(o!("component" => component))
}
