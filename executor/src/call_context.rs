// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `CallContext`: the per-transaction environment that multiplexes a
//! LIFO stack of contract-handler frames -- some synchronous, some
//! dispatched to an external executor -- against a single transaction-wide
//! timeout. The frame stack is protected by one mutex; the mailbox is the
//! sole inter-thread signalling path, matching the one-mutex,
//! one-channel discipline the rest of this workspace uses for shared
//! state (see `bc_scratchpad::ReadOnlyWorldState`, `bc_channel::mailbox`).

use crate::handler::{Handler, HandlerOutcome};
use crate::world_state::WorldState;
use bc_channel::{mailbox, MailboxReceiver, MailboxSender};
use bc_config::StepConfig;
use bc_crypto::Address;
use bc_failure_ext::Result;
use bc_logger::prelude::warn;
use bc_types::status::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Message kinds an external executor (or, in tests, a stand-in
/// `Dispatcher`) delivers back through a `CallContext`'s mailbox.
#[derive(Clone, Debug)]
pub enum Message {
    /// Completes the currently pending async frame.
    Result { status: StatusCode, step_used: u64, value: Vec<u8>, addr: Option<Address> },
    /// A reentrant call requested by the executor: push a new frame
    /// (sync or async, per `handler.is_async()`) and continue.
    Call { handler: Handler },
}

/// A handle to a reserved external-executor environment. Cloneable so
/// both the `CallContext` and whatever drives the executor on the other
/// side can hold one; carries the mailbox sender a `Dispatcher`
/// ultimately delivers results through.
#[derive(Clone)]
pub struct Connection {
    pub ee_type: &'static str,
    pub reply_to: MailboxSender<Message>,
}

/// Dispatches an async `Handler` to its external executor. The wire
/// protocol between this process and that executor is out of scope; a
/// `Dispatcher` only needs to eventually call `connection.reply_to.send`
/// with the matching `Message::Result` (or a `Message::Call` for a
/// reentrant call), exactly as a real executor connection would.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, handler: &Handler, connection: &Connection);
}

struct AsyncFrame {
    handler: Handler,
    dispatched: bool,
}

enum Frame {
    Sync(Handler),
    Async(AsyncFrame),
}

pub struct CallContext {
    frames: Mutex<Vec<Frame>>,
    mailbox_tx: MailboxSender<Message>,
    mailbox_rx: MailboxReceiver<Message>,
    connections: Mutex<HashMap<&'static str, Connection>>,
    deadline: Instant,
    step_limit: u64,
}

impl CallContext {
    /// `step_limit` is the transaction's declared step budget -- a timeout
    /// reports the whole budget as consumed, since no partial step-used
    /// figure is available once an outstanding async frame is abandoned.
    pub fn new(time_limit: Duration, step_limit: u64, initial: Handler) -> Self {
        let (mailbox_tx, mailbox_rx) = mailbox();
        let frame = if initial.is_async() {
            Frame::Async(AsyncFrame { handler: initial, dispatched: false })
        } else {
            Frame::Sync(initial)
        };
        Self {
            frames: Mutex::new(vec![frame]),
            mailbox_tx,
            mailbox_rx,
            connections: Mutex::new(HashMap::new()),
            deadline: Instant::now() + time_limit,
            step_limit,
        }
    }

    pub fn sender(&self) -> MailboxSender<Message> {
        self.mailbox_tx.clone()
    }

    /// Obtains a connection for `ee_type`, reserving one if this is the
    /// first request. Deliberately lazy: a missing connection is
    /// reserved on demand rather than requiring an explicit
    /// `reserve_connection` call up front.
    pub fn get_connection(&self, ee_type: &'static str) -> Connection {
        let mut connections = self.connections.lock().expect("call context connections mutex poisoned");
        connections
            .entry(ee_type)
            .or_insert_with(|| Connection { ee_type, reply_to: self.mailbox_tx.clone() })
            .clone()
    }

    pub fn reserve_connection(&self, ee_type: &'static str) -> Connection {
        self.get_connection(ee_type)
    }

    pub fn dispose(&self) {
        self.connections.lock().expect("call context connections mutex poisoned").clear();
    }

    /// Drives the frame stack to completion: runs every sync frame inline,
    /// dispatches every async frame and awaits its result, and handles
    /// reentrant `Call` messages by pushing further frames. Returns the
    /// result of the outermost frame, or a `Timeout` if the deadline
    /// elapses while an async frame is outstanding.
    pub fn run(
        &self,
        world: &mut WorldState,
        costs: &StepConfig,
        dispatcher: &dyn Dispatcher,
    ) -> Result<(StatusCode, u64, Vec<u8>, Option<Address>)> {
        loop {
            let top = match self.frames.lock().expect("call context frames mutex poisoned").last() {
                Some(Frame::Sync(handler)) => Some(handler.clone()),
                Some(Frame::Async(_)) => None,
                None => unreachable!("CallContext::run always holds at least one frame until it returns"),
            };

            if let Some(handler) = top {
                let HandlerOutcome { status, step_used, value, score_address } = handler.execute_sync(world, costs)?;
                self.frames.lock().expect("call context frames mutex poisoned").pop();
                if let Some(outcome) = self.finish_or_forward(status, step_used, value, score_address)? {
                    return Ok(outcome);
                }
                continue;
            }

            self.dispatch_top_if_needed(dispatcher);
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            match self.mailbox_rx.recv_timeout(remaining) {
                None => {
                    warn!("call context timed out, cancelling outstanding async frames");
                    self.cancel_all_async();
                    return Ok((StatusCode::TIMEOUT, self.step_limit, Vec::new(), None));
                }
                Some(Message::Result { status, step_used, value, addr }) => {
                    self.frames.lock().expect("call context frames mutex poisoned").pop();
                    if let Some(outcome) = self.finish_or_forward(status, step_used, value, addr)? {
                        return Ok(outcome);
                    }
                }
                Some(Message::Call { handler }) => {
                    self.push_frame(handler);
                }
            }
        }
    }

    fn dispatch_top_if_needed(&self, dispatcher: &dyn Dispatcher) {
        let mut frames = self.frames.lock().expect("call context frames mutex poisoned");
        if let Some(Frame::Async(frame)) = frames.last_mut() {
            if !frame.dispatched {
                frame.dispatched = true;
                let handler = frame.handler.clone();
                let ee_type = handler.ee_type().expect("async frame always has an ee_type");
                let connection = self.get_connection(ee_type);
                drop(frames);
                dispatcher.dispatch(&handler, &connection);
            }
        }
    }

    fn push_frame(&self, handler: Handler) {
        let frame = if handler.is_async() {
            Frame::Async(AsyncFrame { handler, dispatched: false })
        } else {
            Frame::Sync(handler)
        };
        self.frames.lock().expect("call context frames mutex poisoned").push(frame);
    }

    /// After a frame completes, either the stack is now empty (the result
    /// belongs to the original caller) or the new top is an async frame
    /// awaiting exactly this reentrant call's result -- a sync frame is
    /// only ever pushed by an async parent's `Call` message, so the
    /// invariant "at most one pending async frame" holds by construction.
    fn finish_or_forward(
        &self,
        status: StatusCode,
        step_used: u64,
        value: Vec<u8>,
        addr: Option<Address>,
    ) -> Result<Option<(StatusCode, u64, Vec<u8>, Option<Address>)>> {
        let is_empty = self.frames.lock().expect("call context frames mutex poisoned").is_empty();
        if is_empty {
            Ok(Some((status, step_used, value, addr)))
        } else {
            self.mailbox_tx.send(Message::Result { status, step_used, value, addr });
            Ok(None)
        }
    }

    fn cancel_all_async(&self) {
        // Cooperative cancellation: the real protocol for telling an
        // external executor to abort is out of scope here (see
        // `Dispatcher`); clearing the stack is enough to guarantee no
        // further `OnResult`/`OnCall` message is acted on.
        self.frames.lock().expect("call context frames mutex poisoned").clear();
    }
}
