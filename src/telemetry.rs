//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing a registry dispatch and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::network::ConnectionId;
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Create a span for a client connection.
    pub fn connection(id: ConnectionId, addr: &SocketAddr) -> Span {
        info_span!("connection", id = id, addr = %addr)
    }

    /// Create a span for a channel actor.
    pub fn channel(name: &str) -> Span {
        info_span!("channel", name = %name)
    }

    /// Create a span for the registry dispatcher.
    pub fn registry() -> Span {
        info_span!("registry")
    }
}
