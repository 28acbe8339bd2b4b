//! Prometheus metrics collection for channeld.
//!
//! Metrics live in `OnceLock` globals registered by [`init`]. Every helper is
//! a no-op until `init` has run, so code paths record unconditionally and
//! tests never need a registry.
//!
//! - `channeld_connected_users` - registered users (gauge)
//! - `channeld_active_channels` - live channel actors (gauge)
//! - `channeld_connections_accepted_total` - accepted sockets
//! - `channeld_disconnects_total{reason}` - closed connections by reason
//! - `channeld_channel_mailbox_overflow_total` - registry sends that hit a full channel mailbox
//! - `channeld_outbound_overflow_total` - connections dropped for a full outbound mailbox
//! - `channeld_messages_relayed_total` - PRIVMSG lines delivered to recipients
//! - `channeld_message_fanout` - recipients per channel broadcast (histogram)
//! - `channeld_command_total{command}` / `channeld_command_duration_seconds{command}`

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Accepted TCP connections.
pub static CONNECTIONS_ACCEPTED: OnceLock<IntCounter> = OnceLock::new();

/// Closed connections by reason.
pub static DISCONNECTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Registry sends that found a channel mailbox full and had to wait.
pub static CHANNEL_MAILBOX_OVERFLOW: OnceLock<IntCounter> = OnceLock::new();

/// Connections closed because their outbound mailbox was full.
pub static OUTBOUND_OVERFLOW: OnceLock<IntCounter> = OnceLock::new();

/// PRIVMSG lines handed to a recipient's outbound mailbox.
pub static MESSAGES_RELAYED: OnceLock<IntCounter> = OnceLock::new();

/// Messages dispatched by the registry, by command.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently registered users.
pub static CONNECTED_USERS: OnceLock<IntGauge> = OnceLock::new();

/// Live channel actors.
pub static ACTIVE_CHANNELS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Recipients per channel broadcast.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Registry dispatch latency by command.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup, before the metrics endpoint is served. Repeated
/// calls are no-ops.
pub fn init() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(CONNECTIONS_ACCEPTED, IntCounter::new("channeld_connections_accepted_total", "Accepted connections"));
    register!(DISCONNECTS, IntCounterVec::new(Opts::new("channeld_disconnects_total", "Closed connections by reason"), &["reason"]));
    register!(CHANNEL_MAILBOX_OVERFLOW, IntCounter::new("channeld_channel_mailbox_overflow_total", "Sends that found a channel mailbox full"));
    register!(OUTBOUND_OVERFLOW, IntCounter::new("channeld_outbound_overflow_total", "Connections dropped for a full outbound mailbox"));
    register!(MESSAGES_RELAYED, IntCounter::new("channeld_messages_relayed_total", "Messages delivered to recipients"));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("channeld_command_total", "Messages dispatched by command"), &["command"]));
    register!(CONNECTED_USERS, IntGauge::new("channeld_connected_users", "Currently registered users"));
    register!(ACTIVE_CHANNELS, IntGauge::new("channeld_active_channels", "Live channels"));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("channeld_message_fanout", "Recipients per channel broadcast")
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0])));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("channeld_command_duration_seconds", "Dispatch latency by command")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
fn inc(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

#[inline]
pub fn connection_accepted() {
    inc(&CONNECTIONS_ACCEPTED);
}

/// Record a closed connection.
#[inline]
pub fn record_disconnect(reason: &str) {
    if let Some(c) = DISCONNECTS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn channel_mailbox_overflow() {
    inc(&CHANNEL_MAILBOX_OVERFLOW);
}

#[inline]
pub fn outbound_overflow() {
    inc(&OUTBOUND_OVERFLOW);
}

#[inline]
pub fn message_relayed() {
    inc(&MESSAGES_RELAYED);
}

/// Adjust the registered users gauge by `delta`.
#[inline]
pub fn add_connected_users(delta: i64) {
    if let Some(g) = CONNECTED_USERS.get() {
        g.add(delta);
    }
}

/// Adjust the live channels gauge by `delta`.
#[inline]
pub fn add_active_channels(delta: i64) {
    if let Some(g) = ACTIVE_CHANNELS.get() {
        g.add(delta);
    }
}

/// Record message fan-out (how many recipients received a channel line).
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(recipients as f64);
    }
}

/// Record a dispatched command with its latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}
