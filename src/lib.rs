pub mod actor;
pub mod config;
pub mod handle;
pub mod hive;
pub mod id;
pub mod mailbox;
pub mod message;
pub mod proxy;

mod cell;
mod worker;

pub use self::actor::Actor;
pub use self::config::{HiveConfig, SliceLimit};
pub use self::handle::{HiveError, HiveHandle};
pub use self::hive::Hive;
pub use self::id::{ActorId, MessageId};
pub use self::mailbox::Mailbox;
pub use self::message::{Body, Message, MessageBuilder};
pub use self::proxy::HiveProxy;
