//! Best-effort reverse DNS for client hostnames.
//!
//! Used once per connection, before registration. Any failure (timeout,
//! NXDOMAIN, no PTR record) falls back to the textual peer IP.

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Hostname resolver shared by all connections.
#[derive(Clone)]
pub struct HostResolver {
    resolver: Option<TokioResolver>,
}

impl HostResolver {
    /// Resolver using the system configuration, or public defaults when
    /// that cannot be read.
    pub fn system() -> Self {
        let resolver = TokioResolver::builder_tokio()
            .map(|b| b.build())
            .unwrap_or_else(|_| {
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            });

        Self {
            resolver: Some(resolver),
        }
    }

    /// Resolver that never queries DNS and always returns the IP.
    pub fn disabled() -> Self {
        Self { resolver: None }
    }

    /// Reverse-resolve `ip`, giving up after `timeout`.
    pub async fn resolve(&self, ip: IpAddr, timeout: Duration) -> String {
        let Some(resolver) = &self.resolver else {
            return ip.to_string();
        };

        match tokio::time::timeout(timeout, resolver.reverse_lookup(ip)).await {
            Ok(Ok(lookup)) => {
                let host = lookup
                    .iter()
                    .next()
                    .map(|ptr| ptr.to_string().trim_end_matches('.').to_string())
                    .filter(|host| !host.is_empty());
                match host {
                    Some(host) => {
                        debug!(%ip, %host, "Resolved hostname");
                        host
                    }
                    None => ip.to_string(),
                }
            }
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "Reverse lookup failed");
                ip.to_string()
            }
            Err(_) => {
                debug!(%ip, ?timeout, "Reverse lookup timed out");
                ip.to_string()
            }
        }
    }
}
