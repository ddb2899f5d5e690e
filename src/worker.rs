use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, Mutex},
    task::JoinSet,
    time::timeout,
};

use crate::{
    cell::{ActorCell, HandlerFailure},
    config::{HiveConfig, SliceLimit},
    handle::HiveHandle,
};

/// Queue of actors that have messages waiting and are ready for a worker.
///
/// The hive pushes onto the queue and any number of workers pop from it. An actor is on the queue
/// at most once at a time; the mailbox's scheduled flag guarantees that.
#[derive(Debug, Clone)]
pub(crate) struct RunQueue {
    sender: mpsc::UnboundedSender<Arc<ActorCell>>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Arc<ActorCell>>>>,
}

impl RunQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub(crate) fn push(&self, cell: Arc<ActorCell>) {
        if let Err(err) = self.sender.send(cell) {
            tracing::error!(actor_id = %err.0.id(), "Run queue closed; actor dropped");
        }
    }

    /// Wait up to `wait` for an actor to become available.
    pub(crate) async fn pop(&self, wait: Duration) -> Option<Arc<ActorCell>> {
        timeout(wait, async { self.receiver.lock().await.recv().await })
            .await
            .ok()
            .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SliceOutcome {
    pub processed: usize,
    /// The actor hit an irrecoverable error or panicked, and should be removed.
    pub failed: bool,
}

/// Process one slice of an actor's mailbox.
///
/// Messages are popped one at a time, so the mailbox lock is only held for the pop and never while
/// the handler runs. The slice ends when the mailbox is empty, when `limit` messages have been
/// processed, or when the actor fails.
pub(crate) async fn process_slice(cell: &ActorCell, limit: SliceLimit) -> SliceOutcome {
    let mut processed = 0;

    while limit.allows(processed) {
        let Some(message) = cell.mailbox().pop() else {
            break;
        };

        let message_id = message.id().clone();
        let directive = message.directive().to_string();
        processed += 1;

        match cell.handle(message).await {
            Ok(()) => {}

            Err(failure @ HandlerFailure::Recoverable(_)) => {
                tracing::warn!(actor_id = %cell.id(), %message_id, %directive,
                               error = %failure, "Received recoverable error in message handler");
            }

            Err(failure) => {
                debug_assert!(failure.is_fatal());
                tracing::error!(actor_id = %cell.id(), %message_id, %directive,
                                error = %failure, "Actor failed handling message");
                return SliceOutcome {
                    processed,
                    failed: true,
                };
            }
        }
    }

    SliceOutcome {
        processed,
        failed: false,
    }
}

struct Worker {
    index: usize,
    hive: HiveHandle,
    run_queue: RunQueue,
    limit: SliceLimit,
    poll_timeout: Duration,
}

impl Worker {
    async fn run(self) {
        tracing::debug!(worker = self.index, "Worker started");

        while !self.hive.is_stopped() {
            let Some(cell) = self.run_queue.pop(self.poll_timeout).await else {
                continue;
            };

            let outcome = process_slice(&cell, self.limit).await;
            tracing::trace!(
                worker = self.index,
                actor_id = %cell.id(),
                processed = outcome.processed,
                "Finished slice"
            );

            if outcome.failed {
                if let Err(err) = self.hive.remove_failed(Arc::clone(&cell)) {
                    tracing::debug!(actor_id = %cell.id(), error = %err,
                                    "Unable to remove failed actor");
                }
            }

            // The hive decides whether the actor goes back on the run queue.
            if let Err(err) = self.hive.reconsider(cell) {
                tracing::debug!(worker = self.index, error = %err,
                                "Unable to hand actor back to the hive");
            }
        }

        tracing::debug!(worker = self.index, "Worker stopped");
    }
}

/// The set of workers belonging to a hive.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    join_set: JoinSet<()>,
}

impl WorkerPool {
    pub(crate) fn start(config: &HiveConfig, hive: &HiveHandle, run_queue: &RunQueue) -> Self {
        let mut join_set = JoinSet::new();
        for index in 0..config.num_workers {
            let worker = Worker {
                index,
                hive: hive.clone(),
                run_queue: run_queue.clone(),
                limit: config.max_messages_per_slice,
                poll_timeout: config.worker_poll_timeout,
            };

            join_set.spawn(worker.run());
        }

        Self { join_set }
    }

    /// Wait for all workers to finish.
    ///
    /// Workers only exit once the hive has been stopped, so this should only be called after
    /// setting the stop flag.
    #[tracing::instrument(skip_all)]
    pub(crate) async fn wait_all(&mut self) {
        tracing::info!(
            "Politely waiting for {} worker(s) to finish their slice",
            self.join_set.len()
        );

        while let Some(result) = self.join_set.join_next().await {
            if let Err(err) = result {
                tracing::error!(error = ?err, "Encountered error joining worker");
            }
        }
    }
}
