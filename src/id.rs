use std::{
    fmt::{self, Display},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use uuid::Uuid;

/// The identifier of an actor within a hive.
///
/// Generated identifiers take the form `<type-name>-<uuid>`, but any string can be used when an
/// actor is created with an explicit identifier. Cloning an `ActorId` is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Arc<str>);

impl ActorId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The identifier of a message.
///
/// Unique within the hive that generated it: `<hive-token>:<counter>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(Arc<str>);

impl MessageId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Generates actor and message identifiers for one hive.
///
/// A UUID takes comparatively long to produce, so message identifiers pair a token generated once
/// per hive with a counter. The counter is a plain atomic, so callers on any thread can generate
/// identifiers without taking a lock.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    token: Uuid,
    counter: AtomicU64,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        Self {
            token: Uuid::new_v4(),
            counter: AtomicU64::new(0),
        }
    }

    pub(crate) fn actor_id(&self, type_name: &str) -> ActorId {
        ActorId::new(format!("{type_name}-{}", Uuid::new_v4()))
    }

    pub(crate) fn message_id(&self) -> MessageId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        MessageId::new(format!("{}:{count}", self.token))
    }
}

/// The last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
