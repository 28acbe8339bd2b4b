//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity.
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Queue capacities, flood control and timeouts.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Message of the Day configuration.
    #[serde(default)]
    pub motd: MotdConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name used as the source of numeric replies (e.g., "irc.example.net").
    pub name: String,
    /// Prometheus HTTP port. `None` or `0` disables the endpoint.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Reverse-resolve client addresses at connect time.
    #[serde(default = "default_resolve_hostnames")]
    pub resolve_hostnames: bool,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:6667").
    pub address: SocketAddr,
}

/// Queue capacities, flood control, and timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Messages allowed per flood window after registration (default: 10).
    #[serde(default = "default_flood_messages")]
    pub flood_messages: u32,
    /// Flood window length in seconds (default: 10).
    #[serde(default = "default_flood_window_secs")]
    pub flood_window_secs: u64,
    /// Per-line write deadline in seconds (default: 10).
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
    /// Connection outbound mailbox capacity (default: 1000).
    #[serde(default = "default_queue_capacity")]
    pub outbound_queue: usize,
    /// Channel actor mailbox capacity (default: 1000).
    #[serde(default = "default_queue_capacity")]
    pub channel_mailbox: usize,
    /// Registry inbound queue capacity (default: 1000).
    #[serde(default = "default_queue_capacity")]
    pub registry_queue: usize,
    /// Longest accepted inbound line in bytes, terminator included (default: 512).
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Lines read per registration attempt before giving up (default: 4).
    #[serde(default = "default_handshake_messages")]
    pub handshake_messages: usize,
    /// Registration attempts before the connection is closed (default: 3).
    #[serde(default = "default_handshake_attempts")]
    pub handshake_attempts: u32,
    /// Reverse DNS timeout in seconds (default: 5).
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,
    /// Longest nickname in bytes (default: 30).
    #[serde(default = "default_max_nick_len")]
    pub max_nick_len: usize,
    /// Longest channel name in bytes (default: 50).
    #[serde(default = "default_max_channel_len")]
    pub max_channel_len: usize,
}

impl LimitsConfig {
    pub fn flood_window(&self) -> Duration {
        Duration::from_secs(self.flood_window_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            flood_messages: default_flood_messages(),
            flood_window_secs: default_flood_window_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            outbound_queue: default_queue_capacity(),
            channel_mailbox: default_queue_capacity(),
            registry_queue: default_queue_capacity(),
            max_line_len: default_max_line_len(),
            handshake_messages: default_handshake_messages(),
            handshake_attempts: default_handshake_attempts(),
            resolve_timeout_secs: default_resolve_timeout_secs(),
            max_nick_len: default_max_nick_len(),
            max_channel_len: default_max_channel_len(),
        }
    }
}

/// MOTD configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotdConfig {
    /// Path to MOTD file (one line per MOTD line).
    pub file: Option<String>,
    /// Inline MOTD lines (used when `file` is not set).
    #[serde(default)]
    pub lines: Vec<String>,
}

impl MotdConfig {
    /// Load MOTD lines from file, or return default MOTD.
    pub fn load_lines(&self) -> Vec<String> {
        if let Some(ref path) = self.file {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    return content.lines().map(|s| s.to_string()).collect();
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to read MOTD file");
                }
            }
        }

        if !self.lines.is_empty() {
            return self.lines.clone();
        }

        vec![
            "Welcome to channeld!".to_string(),
            format!("version {}.", env!("CARGO_PKG_VERSION")),
        ]
    }
}

fn default_resolve_hostnames() -> bool {
    true
}

fn default_flood_messages() -> u32 {
    10
}

fn default_flood_window_secs() -> u64 {
    10
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_max_line_len() -> usize {
    channeld_proto::MAX_IRC_LINE_LEN
}

fn default_handshake_messages() -> usize {
    4
}

fn default_handshake_attempts() -> u32 {
    3
}

fn default_resolve_timeout_secs() -> u64 {
    5
}

fn default_max_nick_len() -> usize {
    30
}

fn default_max_channel_len() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[server]
name = "irc.test"

[listen]
address = "127.0.0.1:6667"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.server.name, "irc.test");
        assert_eq!(config.server.metrics_port, None);
        assert!(config.server.resolve_hostnames);
        assert_eq!(config.listen.address.port(), 6667);

        let limits = &config.limits;
        assert_eq!(limits.flood_messages, 10);
        assert_eq!(limits.flood_window(), Duration::from_secs(10));
        assert_eq!(limits.write_timeout(), Duration::from_secs(10));
        assert_eq!(limits.outbound_queue, 1000);
        assert_eq!(limits.channel_mailbox, 1000);
        assert_eq!(limits.registry_queue, 1000);
        assert_eq!(limits.max_line_len, 512);
        assert_eq!(limits.handshake_messages, 4);
        assert_eq!(limits.handshake_attempts, 3);
        assert_eq!(limits.resolve_timeout(), Duration::from_secs(5));
        assert_eq!(limits.max_nick_len, 30);
        assert_eq!(limits.max_channel_len, 50);
    }

    #[test]
    fn partial_limits_keep_other_defaults() {
        let text = format!("{MINIMAL}\n[limits]\nflood_messages = 50\n");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.limits.flood_messages, 50);
        assert_eq!(config.limits.outbound_queue, 1000);
    }

    #[test]
    fn missing_server_section_is_an_error() {
        let err = Config::parse("[listen]\naddress = \"127.0.0.1:6667\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/channeld.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.name, "irc.test");
    }

    #[test]
    fn motd_prefers_file_then_inline_then_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from file").unwrap();
        writeln!(file, "second").unwrap();

        let motd = MotdConfig {
            file: Some(file.path().display().to_string()),
            lines: vec!["inline".into()],
        };
        assert_eq!(motd.load_lines(), vec!["from file", "second"]);

        let motd = MotdConfig {
            file: Some("/nonexistent/motd.txt".into()),
            lines: vec!["inline".into()],
        };
        assert_eq!(motd.load_lines(), vec!["inline"]);

        let motd = MotdConfig::default();
        assert_eq!(motd.load_lines()[0], "Welcome to channeld!");
    }
}
