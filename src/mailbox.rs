use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::message::Message;

#[derive(Debug, Default)]
struct MailboxState {
    queue: VecDeque<Message>,
    // Set while the owning actor is on the run queue or held by a worker.
    scheduled: bool,
    closed: bool,
}

/// An actor's queue of pending messages.
///
/// A mailbox is a FIFO of messages behind a mutex. The hive appends to it while routing and a
/// worker pops from it while processing, and each of those operations holds the lock only for
/// the single push or pop. The lock is never held while an actor handles a message.
///
/// The mailbox also records whether its actor is currently scheduled, so that the decision to put
/// an actor on the run queue is made under the same lock that guards its messages.
#[derive(Debug, Default)]
pub struct Mailbox {
    state: Mutex<MailboxState>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the back of the mailbox.
    ///
    /// Returns `false` if the mailbox has been closed, in which case the message is dropped.
    pub fn push(&self, message: Message) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        state.queue.push_back(message);
        true
    }

    /// Take the message at the front of the mailbox, if there is one.
    pub fn pop(&self) -> Option<Message> {
        self.state.lock().queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    /// Append a message and claim the actor for scheduling.
    ///
    /// Returns `true` when the caller must put the actor on the run queue: the actor was idle and
    /// this delivery made it eligible. While the actor is already queued or running this returns
    /// `false`, and the pending message is picked up by the current slice or by re-admission.
    pub(crate) fn deliver(&self, message: Message) -> Delivery {
        let mut state = self.state.lock();
        if state.closed {
            return Delivery::Closed;
        }

        state.queue.push_back(message);
        if state.scheduled {
            Delivery::Queued
        } else {
            state.scheduled = true;
            Delivery::Admit
        }
    }

    /// Decide whether the actor stays scheduled once a worker has finished a slice.
    ///
    /// Returns `true` when messages remain, in which case the actor stays scheduled and must go
    /// back on the run queue. Otherwise the scheduled flag is cleared, so the next delivery will
    /// admit the actor again.
    pub(crate) fn finish_slice(&self) -> bool {
        let mut state = self.state.lock();
        if !state.closed && !state.queue.is_empty() {
            return true;
        }

        state.scheduled = false;
        false
    }

    /// Close the mailbox, dropping any pending messages and returning how many were dropped.
    pub(crate) fn close(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The actor was idle and must be pushed onto the run queue.
    Admit,
    /// The actor is already scheduled; the message waits in the mailbox.
    Queued,
    /// The mailbox was closed and the message was dropped.
    Closed,
}
