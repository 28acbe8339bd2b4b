//! channeld - multi-user chat server.

use channeld::{Config, Server, http, metrics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        listen = %config.listen.address,
        "Starting channeld"
    );

    // Convention: metrics_port = 0 or absent disables the HTTP endpoint.
    match config.server.metrics_port {
        Some(port) if port != 0 => {
            metrics::init();
            tokio::spawn(async move {
                http::run_http_server(port).await;
            });
            info!(port, "Prometheus HTTP server started");
        }
        _ => info!("Metrics disabled"),
    }

    let server = Server::bind(config).await?;
    info!(addr = %server.local_addr()?, "Server ready");
    server.run().await
}
