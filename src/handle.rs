use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    cell::ActorCell,
    hive::Action,
    id::{ActorId, IdGenerator, MessageId},
    mailbox::Mailbox,
    message::MessageBuilder,
    proxy::HiveProxy,
    Actor,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HiveError {
    /// The hive is no longer accepting work.
    ///
    /// Either the hive has been asked to stop, or its control loop has already finished and the
    /// action queue has been closed.
    #[error("Hive has stopped")]
    Stopped,

    /// The actor's `create` method returned an error, so the actor was never registered.
    #[error("Failed to create actor of type {actor_type}: {reason}")]
    ActorCreation {
        actor_type: &'static str,
        reason: String,
    },

    #[error("Invalid hive configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A handle to a hive.
///
/// Hive handles can be cloned and passed between threads. A handle is how code outside of the hive
/// creates actors, sends them messages and eventually stops the hive. Actors themselves are given a
/// [`HiveProxy`] instead, which offers the same operations except for stopping the hive.
///
/// All of the operations on a handle are fire-and-forget: they place an action on the hive's queue
/// and return immediately. They only fail when the hive has stopped.
#[derive(Clone)]
pub struct HiveHandle {
    actions: mpsc::UnboundedSender<Action>,
    ids: Arc<IdGenerator>,
    stop: Arc<AtomicBool>,
}

impl Debug for HiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HiveHandle(stopped: {})", self.is_stopped())
    }
}

impl HiveHandle {
    pub(crate) fn new(actions: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            actions,
            ids: Arc::new(IdGenerator::new()),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new actor of type `A` and register it with the hive.
    ///
    /// The actor is given a generated identifier of the form `<type-name>-<uuid>`, which is
    /// returned. The actor is constructed immediately on the calling thread; registration happens
    /// on the hive's control loop, ahead of any message sent to the actor after this returns.
    pub fn create_actor<A: Actor>(&self, args: A::Args) -> Result<ActorId, HiveError> {
        let id = self.ids.actor_id(A::type_name());
        self.create_actor_with_id::<A>(id, args)
    }

    /// Create a new actor of type `A` with a chosen identifier.
    ///
    /// If another actor is already registered under the same identifier when the hive processes
    /// the registration, the new actor is discarded and the existing actor is left in place.
    pub fn create_actor_with_id<A: Actor>(
        &self,
        id: impl Into<ActorId>,
        args: A::Args,
    ) -> Result<ActorId, HiveError> {
        let id = id.into();
        let mailbox = Arc::new(self.new_mailbox());
        let proxy = HiveProxy::new(self.clone(), id.clone(), Arc::clone(&mailbox));
        let actor = A::create(proxy, args).map_err(|err| HiveError::ActorCreation {
            actor_type: A::type_name(),
            reason: format!("{err:?}"),
        })?;

        let cell = ActorCell::new(id.clone(), mailbox, actor);
        self.post(Action::RegisterActor(Arc::new(cell)))?;
        Ok(id)
    }

    /// Send a message, returning its identifier.
    ///
    /// A message identifier is generated unless the builder carries one. Delivery is asynchronous:
    /// if the target is not registered by the time the hive routes the message, the message is
    /// dropped and a warning is logged, but the sender is not told.
    pub fn send_message(&self, message: MessageBuilder) -> Result<MessageId, HiveError> {
        let message = message.finish(|| self.ids.message_id());
        let id = message.id().clone();
        self.post(Action::RouteMessage(message))?;
        Ok(id)
    }

    /// Remove an actor from the hive.
    ///
    /// Removal happens when the hive processes it: from then on, messages still waiting in the
    /// actor's mailbox are dropped and later messages to the actor are treated like messages to any
    /// other unknown actor. A worker already running the actor finishes the message in hand, and may
    /// handle further queued messages until then. An actor removing itself through its own
    /// [`HiveProxy`] stops receiving messages straight away.
    pub fn remove_actor(&self, id: &ActorId) -> Result<(), HiveError> {
        self.post(Action::RemoveActor(id.clone()))
    }

    /// Create a new, empty mailbox.
    pub fn new_mailbox(&self) -> Mailbox {
        Mailbox::new()
    }

    /// Ask the hive to stop.
    ///
    /// The control loop and the workers notice within one poll timeout. Workers finish the slice
    /// they are processing before they exit; a handler that is running is never interrupted.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub(crate) fn remove_failed(&self, cell: Arc<ActorCell>) -> Result<(), HiveError> {
        self.post(Action::RemoveFailed(cell))
    }

    pub(crate) fn reconsider(&self, cell: Arc<ActorCell>) -> Result<(), HiveError> {
        self.post(Action::ReconsiderActor(cell))
    }

    fn post(&self, action: Action) -> Result<(), HiveError> {
        if self.is_stopped() {
            return Err(HiveError::Stopped);
        }

        self.actions.send(action).map_err(|_| HiveError::Stopped)
    }
}
