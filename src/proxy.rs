use std::{fmt::Debug, sync::Arc};

use crate::{
    handle::{HiveError, HiveHandle},
    id::{ActorId, MessageId},
    mailbox::Mailbox,
    message::MessageBuilder,
    Actor,
};

/// An actor's view of the hive.
///
/// Each actor receives its own proxy when it is created. The proxy lets the actor send messages and
/// create or remove actors, but it offers no way to reach the hive's registry, its run queue or
/// another actor's mailbox, and it cannot stop the hive.
#[derive(Clone)]
pub struct HiveProxy {
    hive: HiveHandle,
    actor: ActorId,
    // The owning actor's mailbox, closed directly on self-removal.
    mailbox: Arc<Mailbox>,
}

impl Debug for HiveProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HiveProxy({})", self.actor)
    }
}

impl HiveProxy {
    pub(crate) fn new(hive: HiveHandle, actor: ActorId, mailbox: Arc<Mailbox>) -> Self {
        Self {
            hive,
            actor,
            mailbox,
        }
    }

    /// The identifier of the actor this proxy belongs to.
    pub fn id(&self) -> &ActorId {
        &self.actor
    }

    /// Send a message.
    ///
    /// If the message does not name a sender, it is sent from the actor owning this proxy.
    pub fn send_message(&self, message: MessageBuilder) -> Result<MessageId, HiveError> {
        let message = if message.has_sender() {
            message
        } else {
            message.from(self.actor.clone())
        };

        self.hive.send_message(message)
    }

    pub fn create_actor<A: Actor>(&self, args: A::Args) -> Result<ActorId, HiveError> {
        self.hive.create_actor::<A>(args)
    }

    pub fn create_actor_with_id<A: Actor>(
        &self,
        id: impl Into<ActorId>,
        args: A::Args,
    ) -> Result<ActorId, HiveError> {
        self.hive.create_actor_with_id::<A>(id, args)
    }

    /// Remove an actor from the hive.
    ///
    /// When `id` is the owning actor, its mailbox is closed before this returns: messages still
    /// queued for it are dropped, including any the current slice has not reached yet.
    pub fn remove_actor(&self, id: &ActorId) -> Result<(), HiveError> {
        if id == &self.actor {
            let dropped = self.mailbox.close();
            tracing::debug!(actor_id = %id, dropped, "Actor is removing itself");
        }

        self.hive.remove_actor(id)
    }

    pub fn new_mailbox(&self) -> Mailbox {
        self.hive.new_mailbox()
    }
}
