// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A small bounded mailbox used as the single inter-thread signalling path
//! between a `CallContext` and the external executor driving it. Unlike
//! `std::sync::mpsc::sync_channel`, which blocks a sender when the mailbox
//! is full, `Mailbox::send` panics on overflow: the mailbox only ever holds
//! one outstanding `CallRequest` and its matching `Result`, so a full
//! mailbox means the executor protocol was violated, not that the consumer
//! is merely slow.

use bc_logger::prelude::error;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

const CAPACITY: usize = 8;

struct Shared<T> {
    queue: Mutex<VecDeque<T>>,
    condvar: Condvar,
}

/// The sending half of a mailbox. Cloneable so both the CallContext thread
/// and the worker thread driving an async contract handler can hold one.
pub struct MailboxSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

pub struct MailboxReceiver<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a mailbox bounded to 8 in-flight messages.
pub fn mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::with_capacity(CAPACITY)),
        condvar: Condvar::new(),
    });
    (
        MailboxSender { shared: shared.clone() },
        MailboxReceiver { shared },
    )
}

impl<T> MailboxSender<T> {
    /// Enqueues `message`. Panics if the mailbox is already at capacity,
    /// which indicates the executor protocol sent more messages than the
    /// receiver ever drains.
    pub fn send(&self, message: T) {
        let mut queue = self.shared.queue.lock().expect("mailbox mutex poisoned");
        if queue.len() >= CAPACITY {
            error!("mailbox overflow"; "capacity" => CAPACITY);
            panic!("mailbox overflow: more than {} messages in flight", CAPACITY);
        }
        queue.push_back(message);
        self.shared.condvar.notify_one();
    }
}

impl<T> MailboxReceiver<T> {
    /// Blocks until a message is available and returns it.
    pub fn recv(&self) -> T {
        let mut queue = self.shared.queue.lock().expect("mailbox mutex poisoned");
        loop {
            if let Some(message) = queue.pop_front() {
                return message;
            }
            queue = self.shared.condvar.wait(queue).expect("mailbox mutex poisoned");
        }
    }

    /// Blocks until a message is available or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let (mut queue, timed_out) = self
            .shared
            .condvar
            .wait_timeout_while(
                self.shared.queue.lock().expect("mailbox mutex poisoned"),
                timeout,
                |q| q.is_empty(),
            )
            .expect("mailbox mutex poisoned");
        if timed_out.timed_out() {
            None
        } else {
            queue.pop_front()
        }
    }
}
