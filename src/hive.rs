use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use tokio::{sync::mpsc, time::timeout};

use crate::{
    cell::ActorCell,
    config::HiveConfig,
    handle::{HiveError, HiveHandle},
    id::ActorId,
    mailbox::Delivery,
    message::Message,
    worker::{RunQueue, WorkerPool},
};

/// Actions processed by the hive's control loop.
///
/// Every change to the registry and every routing decision goes through this queue, so that only
/// the control loop ever touches the registry.
#[derive(Debug)]
pub(crate) enum Action {
    RegisterActor(Arc<ActorCell>),
    RemoveActor(ActorId),
    /// A worker saw this actor fail. Only this cell is removed, never a newer actor with its id.
    RemoveFailed(Arc<ActorCell>),
    RouteMessage(Message),
    /// A worker has finished a slice of this actor's messages.
    ReconsiderActor(Arc<ActorCell>),
}

/// The hive: owner of the actor registry, the run queue and the worker pool.
///
/// A hive is created from a [`HiveConfig`], after which [`Hive::handle`] gives out handles used to
/// create actors and send messages. Nothing is processed until [`Hive::run`] is awaited (usually in
/// a spawned task), and `run` returns once the hive has been stopped through a handle and all the
/// workers have finished.
///
/// ```no_run
/// # use hive_actors::{Hive, HiveConfig};
/// # async fn example() -> Result<(), hive_actors::HiveError> {
/// let hive = Hive::new(HiveConfig::default())?;
/// let handle = hive.handle();
/// let running = tokio::spawn(hive.run());
///
/// // ... create actors and send messages with `handle` ...
///
/// handle.stop();
/// let _ = running.await;
/// # Ok(())
/// # }
/// ```
pub struct Hive {
    config: HiveConfig,
    handle: HiveHandle,
    actions: mpsc::UnboundedReceiver<Action>,
    registry: HashMap<ActorId, Arc<ActorCell>>,
    run_queue: RunQueue,
}

impl std::fmt::Debug for Hive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hive")
            .field("config", &self.config)
            .field("actors", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Hive {
    pub fn new(config: HiveConfig) -> Result<Self, HiveError> {
        config.validate()?;
        let (sender, actions) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            handle: HiveHandle::new(sender),
            actions,
            registry: HashMap::new(),
            run_queue: RunQueue::new(),
        })
    }

    /// Get a handle to this hive.
    pub fn handle(&self) -> HiveHandle {
        self.handle.clone()
    }

    /// Run the hive until it is stopped.
    ///
    /// This starts the workers and then runs the control loop on the current task. Once a handle
    /// has called [`HiveHandle::stop`], the loop exits and this waits for every worker to finish
    /// the slice it is working on.
    #[tracing::instrument(skip_all)]
    pub async fn run(mut self) {
        let mut workers = WorkerPool::start(&self.config, &self.handle, &self.run_queue);
        tracing::info!(
            num_workers = self.config.num_workers,
            max_messages_per_slice = ?self.config.max_messages_per_slice,
            "Hive started"
        );

        while !self.handle.is_stopped() {
            let action = match timeout(self.config.dispatch_poll_timeout, self.actions.recv()).await
            {
                Ok(Some(action)) => action,
                Ok(None) => {
                    tracing::warn!("Hive action queue closed");
                    break;
                }
                Err(_) => continue,
            };

            self.apply(action);
        }

        // Workers watch the same flag, which may not be set if the queue closed on us.
        self.handle.stop();
        workers.wait_all().await;

        tracing::info!(remaining_actors = self.registry.len(), "Hive stopped");
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::RegisterActor(cell) => self.register(cell),
            Action::RemoveActor(id) => self.remove(&id),
            Action::RemoveFailed(cell) => self.remove_failed(cell),
            Action::RouteMessage(message) => self.route(message),
            Action::ReconsiderActor(cell) => self.reconsider(cell),
        }
    }

    fn register(&mut self, cell: Arc<ActorCell>) {
        match self.registry.entry(cell.id().clone()) {
            Entry::Occupied(_) => {
                tracing::error!(
                    actor_id = %cell.id(),
                    actor_type = cell.type_name(),
                    "Refusing to register actor: identifier already in use"
                );
            }

            Entry::Vacant(entry) => {
                tracing::debug!(
                    actor_id = %cell.id(),
                    actor_type = cell.type_name(),
                    "Registered actor"
                );
                entry.insert(cell);
            }
        }
    }

    fn remove(&mut self, id: &ActorId) {
        let Some(cell) = self.registry.remove(id) else {
            tracing::warn!(actor_id = %id, "Cannot remove actor that is not registered");
            return;
        };

        let dropped = cell.mailbox().close();
        if dropped > 0 {
            tracing::warn!(actor_id = %id, dropped, "Removed actor with pending messages");
        } else {
            tracing::debug!(actor_id = %id, "Removed actor");
        }
    }

    fn remove_failed(&mut self, cell: Arc<ActorCell>) {
        let registered = self
            .registry
            .get(cell.id())
            .is_some_and(|current| Arc::ptr_eq(current, &cell));

        let dropped = cell.mailbox().close();
        if !registered {
            tracing::debug!(actor_id = %cell.id(), dropped, "Failed actor was already removed");
            return;
        }

        self.registry.remove(cell.id());
        tracing::warn!(
            actor_id = %cell.id(),
            actor_type = cell.type_name(),
            dropped,
            "Removed failed actor"
        );
    }

    fn route(&self, message: Message) {
        let Some(cell) = self.registry.get(message.to()) else {
            // TODO: send a reply back to `from` once replies for undeliverable messages exist.
            tracing::warn!(
                to = %message.to(),
                from = ?message.from(),
                message_id = %message.id(),
                directive = message.directive(),
                "Dropping message for unknown actor"
            );
            return;
        };

        tracing::trace!(
            to = %message.to(),
            message_id = %message.id(),
            directive = message.directive(),
            "Routing message"
        );

        match cell.mailbox().deliver(message) {
            Delivery::Admit => self.run_queue.push(Arc::clone(cell)),
            Delivery::Queued => {}
            Delivery::Closed => {
                tracing::warn!(actor_id = %cell.id(), "Dropping message for closed mailbox");
            }
        }
    }

    fn reconsider(&self, cell: Arc<ActorCell>) {
        let registered = self
            .registry
            .get(cell.id())
            .is_some_and(|current| Arc::ptr_eq(current, &cell));

        if !registered {
            tracing::trace!(actor_id = %cell.id(), "Not requeueing actor that was removed");
            return;
        }

        if cell.mailbox().finish_slice() {
            self.run_queue.push(cell);
        }
    }
}
