use crate::{id::short_type_name, message::Message, proxy::HiveProxy};

/// Trait for all actors.
///
/// Any type that needs to live in a [`Hive`](crate::Hive) should implement this trait. Actors are
/// created through [`HiveHandle::create_actor`](crate::HiveHandle::create_actor) (or the same
/// method on a [`HiveProxy`]) and from then on are only reachable by sending them messages.
pub trait Actor: Send + Sized + 'static {
    /// The error type for the actor.
    ///
    /// When an actor handles a message, it can return this error type to indicate that the message
    /// could not be handled. The hive logs the error and consults [`Actor::is_recoverable`] to
    /// decide whether the actor keeps running.
    type Error: std::fmt::Debug + Send;

    /// The arguments to the actor creation.
    ///
    /// These arguments, along with the actor's [`HiveProxy`], are passed to [`Actor::create`].
    type Args: Send;

    /// The type name used as the prefix of generated actor identifiers.
    ///
    /// By default this is the last path segment of the actor's Rust type name, so an actor of type
    /// `my_app::Echo` gets identifiers like `Echo-6f1c...`.
    fn type_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Create the actor.
    ///
    /// The proxy is bound to the new actor: its [`HiveProxy::id`] is the actor's identifier, and
    /// messages sent through it default to being from this actor. The actor should keep the proxy
    /// if it wants to send messages or manage other actors later on.
    ///
    /// If this returns an error the actor is never registered, and the error is reported to the
    /// caller of `create_actor`.
    fn create(proxy: HiveProxy, args: Self::Args) -> Result<Self, Self::Error>;

    /// Handle a single message.
    ///
    /// Handlers are never invoked concurrently for the same actor. A handler should not block the
    /// thread it runs on for long, as it is sharing a worker with every other actor in the hive.
    fn handle_message(
        &mut self,
        message: Message,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + std::marker::Send;

    /// Check if an error is recoverable (default is no).
    ///
    /// This method is invoked whenever an error is returned from [`Actor::handle_message`]. If it
    /// returns `true`, the error is logged as a warning and the actor carries on with its next
    /// message. If it returns `false` (which is the default), the actor is removed from the hive
    /// and any messages still in its mailbox are dropped.
    #[allow(unused_variables)]
    fn is_recoverable(&mut self, error: &Self::Error) -> bool {
        false
    }
}
