use std::{any::Any, panic::AssertUnwindSafe, pin::Pin, sync::Arc};

use futures::{Future, FutureExt};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{id::ActorId, mailbox::Mailbox, message::Message, Actor};

/// The ways in which handling a single message can fail.
#[derive(Debug, Error)]
pub(crate) enum HandlerFailure {
    #[error("Recoverable error in actor: {0}")]
    Recoverable(String),
    #[error("Irrecoverable error in actor: {0}")]
    Irrecoverable(String),
    #[error("Actor panicked: {0}")]
    Panicked(String),
}

impl HandlerFailure {
    pub(crate) fn is_fatal(&self) -> bool {
        !matches!(self, HandlerFailure::Recoverable(_))
    }
}

// Type-erased message handling, so the hive can hold actors of any type.
trait Behavior: Send {
    fn handle<'a>(
        &'a mut self,
        message: Message,
    ) -> Pin<Box<dyn Future<Output = Result<(), HandlerFailure>> + Send + 'a>>;
}

struct Hosted<A: Actor> {
    actor: A,
}

impl<A: Actor> Behavior for Hosted<A> {
    fn handle<'a>(
        &'a mut self,
        message: Message,
    ) -> Pin<Box<dyn Future<Output = Result<(), HandlerFailure>> + Send + 'a>> {
        Box::pin(async move {
            match self.actor.handle_message(message).await {
                Ok(()) => Ok(()),
                Err(error) => {
                    let recoverable = self.actor.is_recoverable(&error);
                    let error = format!("{error:?}");
                    if recoverable {
                        Err(HandlerFailure::Recoverable(error))
                    } else {
                        Err(HandlerFailure::Irrecoverable(error))
                    }
                }
            }
        })
    }
}

/// An actor as held by the hive: its identity, its mailbox and its behaviour.
///
/// Cells are shared between the registry, the run queue and the worker processing the actor. The
/// behaviour sits behind an async mutex, but the hive never admits an actor to the run queue twice,
/// so that mutex is never contended.
pub(crate) struct ActorCell {
    id: ActorId,
    type_name: &'static str,
    mailbox: Arc<Mailbox>,
    behavior: Mutex<Box<dyn Behavior>>,
}

impl std::fmt::Debug for ActorCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorCell")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("mailbox", &self.mailbox)
            .finish_non_exhaustive()
    }
}

impl ActorCell {
    pub(crate) fn new<A: Actor>(id: ActorId, mailbox: Arc<Mailbox>, actor: A) -> Self {
        Self {
            id,
            type_name: A::type_name(),
            mailbox,
            behavior: Mutex::new(Box::new(Hosted { actor })),
        }
    }

    pub(crate) fn id(&self) -> &ActorId {
        &self.id
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Run the actor's handler for one message, turning errors and panics into a failure.
    pub(crate) async fn handle(&self, message: Message) -> Result<(), HandlerFailure> {
        let mut behavior = self.behavior.lock().await;
        match AssertUnwindSafe(behavior.handle(message)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(HandlerFailure::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
