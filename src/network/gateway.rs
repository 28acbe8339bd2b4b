//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listen socket and spawns a Connection task for each
//! incoming client.

use crate::network::connection::{Connection, ConnectionContext, next_connection_id};
use crate::telemetry::spans;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, instrument};

/// Pause per consecutive accept failure.
const ACCEPT_PENALTY: Duration = Duration::from_millis(50);
/// Longest pause between accept retries.
const ACCEPT_PENALTY_CAP: Duration = Duration::from_secs(1);

/// Delay before the next accept after `failures` consecutive errors.
fn accept_delay(failures: u32) -> Duration {
    ACCEPT_PENALTY
        .saturating_mul(failures)
        .min(ACCEPT_PENALTY_CAP)
}

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    context: Arc<ConnectionContext>,
}

impl Gateway {
    /// Bind the gateway to `addr`.
    pub async fn bind(addr: SocketAddr, context: Arc<ConnectionContext>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");
        Ok(Self { listener, context })
    }

    /// The bound address (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let mut failures: u32 = 0;
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    failures = 0;
                    crate::metrics::connection_accepted();
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let id = next_connection_id();
                    info!(id, %addr, "Connection accepted");

                    let connection = Connection::new(id, stream, addr, Arc::clone(&self.context));
                    tokio::spawn(connection.run().instrument(spans::connection(id, &addr)));
                }
                Err(e) => {
                    // EMFILE and friends persist until sockets close; back off.
                    failures = failures.saturating_add(1);
                    let delay = accept_delay(failures);
                    error!(error = %e, failures, ?delay, "Accept failed");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_delay_grows_then_caps() {
        assert_eq!(accept_delay(1), Duration::from_millis(50));
        assert_eq!(accept_delay(4), Duration::from_millis(200));
        assert_eq!(accept_delay(20), ACCEPT_PENALTY_CAP);
        assert_eq!(accept_delay(u32::MAX), ACCEPT_PENALTY_CAP);
    }
}
