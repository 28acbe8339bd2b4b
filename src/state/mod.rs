//! State management module.
//!
//! The `Registry` is the single owner of user and channel maps; each channel's
//! membership lives in its own `ChannelActor`.

mod actor;
mod registry;
mod user;

pub use actor::{ChannelActor, ChannelEvent, DeliverySet, Member};
pub use registry::{RegistrationReply, RegistrationRequest, Registry, RegistryEvent};
pub use user::User;
