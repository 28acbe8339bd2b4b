//! channeld - a small multi-user chat server speaking a subset of IRC.
//!
//! Connections, channels, and the central registry are Tokio actors that
//! communicate only through bounded mailboxes.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod network;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use server::Server;
