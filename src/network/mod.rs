//! Network module.
//!
//! Contains the Gateway (TCP listener), Connection handler, flood control,
//! and hostname resolution.

mod connection;
mod gateway;
pub mod limit;
pub mod resolve;

pub use connection::{
    Connection, ConnectionContext, ConnectionHandle, ConnectionId, next_connection_id,
};
pub use gateway::Gateway;
pub use resolve::HostResolver;
