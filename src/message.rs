use std::{any::Any, fmt::Debug, sync::Arc};

use crate::id::{ActorId, MessageId};

/// The opaque payload of a message.
///
/// The hive never looks inside a body: it is handed to the receiving actor untouched, and the
/// actor recovers the value with [`Body::downcast_ref`]. Cloning a `Body` only clones a reference.
#[derive(Clone, Default)]
pub struct Body(Option<Arc<dyn Any + Send + Sync>>);

impl Body {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Get a reference to the payload if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref()
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Body(empty)")
        } else {
            write!(f, "Body(..)")
        }
    }
}

/// A message routed through the hive.
///
/// Messages are immutable once built. They are created when a [`MessageBuilder`] is sent, at which
/// point a [`MessageId`] is generated unless the builder named one, and they are consumed exactly
/// once by the target actor's handler.
#[derive(Debug, Clone)]
pub struct Message {
    to: ActorId,
    from: Option<ActorId>,
    directive: String,
    body: Body,
    id: MessageId,
    in_reply_to: Option<MessageId>,
    wants_reply: bool,
}

impl Message {
    /// Start building a message to `to` asking it to perform `directive`.
    pub fn build(to: impl Into<ActorId>, directive: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(to, directive)
    }

    pub fn to(&self) -> &ActorId {
        &self.to
    }

    pub fn from(&self) -> Option<&ActorId> {
        self.from.as_ref()
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn in_reply_to(&self) -> Option<&MessageId> {
        self.in_reply_to.as_ref()
    }

    pub fn wants_reply(&self) -> bool {
        self.wants_reply
    }

    /// Start building a reply to this message.
    ///
    /// The reply is addressed to the sender of this message and links back to it through
    /// `in_reply_to`. Returns `None` when the message has no sender to reply to.
    pub fn reply_to(&self, directive: impl Into<String>) -> Option<MessageBuilder> {
        let from = self.from.clone()?;
        Some(MessageBuilder::new(from, directive).in_reply_to(self.id.clone()))
    }
}

/// Builder for a [`Message`] that has not been sent yet.
///
/// Every field other than the target and the directive is optional. The builder is passed to
/// `send_message`, which fills in the message identifier if one was not given.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    to: ActorId,
    from: Option<ActorId>,
    directive: String,
    body: Body,
    id: Option<MessageId>,
    in_reply_to: Option<MessageId>,
    wants_reply: bool,
}

impl MessageBuilder {
    pub fn new(to: impl Into<ActorId>, directive: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: None,
            directive: directive.into(),
            body: Body::empty(),
            id: None,
            in_reply_to: None,
            wants_reply: false,
        }
    }

    pub fn from(mut self, from: impl Into<ActorId>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn body<T: Any + Send + Sync>(mut self, body: T) -> Self {
        self.body = Body::new(body);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn in_reply_to(mut self, id: MessageId) -> Self {
        self.in_reply_to = Some(id);
        self
    }

    pub fn wants_reply(mut self, wants_reply: bool) -> Self {
        self.wants_reply = wants_reply;
        self
    }

    pub(crate) fn has_sender(&self) -> bool {
        self.from.is_some()
    }

    pub(crate) fn finish(self, generate_id: impl FnOnce() -> MessageId) -> Message {
        Message {
            to: self.to,
            from: self.from,
            directive: self.directive,
            body: self.body,
            id: self.id.unwrap_or_else(generate_id),
            in_reply_to: self.in_reply_to,
            wants_reply: self.wants_reply,
        }
    }
}
