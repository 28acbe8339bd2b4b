//! Server assembly: registry, connection context, and gateway.

use crate::config::Config;
use crate::network::{ConnectionContext, Gateway, HostResolver};
use crate::state::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// A bound, not yet running, chat server.
pub struct Server {
    gateway: Gateway,
}

impl Server {
    /// Start the registry and bind the listener.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let server_name: Arc<str> = Arc::from(config.server.name.as_str());
        let limits = config.limits;

        let motd = config.motd.load_lines();
        info!(lines = motd.len(), "MOTD loaded");

        let registry = Registry::new(Arc::clone(&server_name), motd, &limits)
            .spawn(limits.registry_queue);

        let resolver = if config.server.resolve_hostnames {
            HostResolver::system()
        } else {
            HostResolver::disabled()
        };

        let context = Arc::new(ConnectionContext {
            server_name,
            registry,
            resolver,
            limits,
        });

        let gateway = Gateway::bind(config.listen.address, context).await?;
        Ok(Self { gateway })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.gateway.local_addr()
    }

    /// Accept connections until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        self.gateway.run().await
    }
}
