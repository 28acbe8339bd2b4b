//! Test server management.
//!
//! Runs a server in-process on an ephemeral loopback port.

use channeld::config::{Config, LimitsConfig, ListenConfig, MotdConfig, ServerConfig};
use channeld::Server;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// A test server instance. Stops when dropped.
pub struct TestServer {
    addr: SocketAddr,
    task: JoinHandle<anyhow::Result<()>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server with default limits.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn a server after adjusting the default test configuration.
    pub async fn spawn_with<F>(configure: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = Config {
            server: ServerConfig {
                name: "test.server".into(),
                metrics_port: None,
                resolve_hostnames: false,
            },
            listen: ListenConfig {
                address: "127.0.0.1:0".parse()?,
            },
            limits: LimitsConfig::default(),
            motd: MotdConfig {
                file: None,
                lines: vec!["Test Server".into()],
            },
        };
        configure(&mut config);

        let server = Server::bind(config).await?;
        let addr = server.local_addr()?;
        let task = tokio::spawn(server.run());

        Ok(Self { addr, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
