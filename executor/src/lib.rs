// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! World state, call context and transition execution: the pipeline a
//! block manager drives to turn a proposed block's transaction lists into
//! a new state root and receipts.

pub mod call_context;
pub mod handler;
pub mod lock;
pub mod service;
pub mod transition;
pub mod world_state;

pub use call_context::{CallContext, Connection, Dispatcher, Message};
pub use handler::{Handler, HandlerOutcome};
pub use lock::{LockGuardSet, LockMode, LockRequest, LockTable};
pub use service::{NoPatches, Service};
pub use transition::{Canceler, Transition, TransitionCallback, TransitionOutput};
pub use world_state::WorldState;
