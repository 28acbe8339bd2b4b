//! Flood protection.
//!
//! A fixed-window counter: the window restarts once it is older than its
//! length, regardless of how many messages arrived in it.

use std::time::{Duration, Instant};

/// Per-connection inbound message limiter.
#[derive(Debug)]
pub struct FloodGuard {
    limit: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

impl FloodGuard {
    /// Allow `limit` messages per `window`, starting now.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::new_at(limit, window, Instant::now())
    }

    /// Allow `limit` messages per `window`, with the first window opening at `start`.
    pub fn new_at(limit: u32, window: Duration, start: Instant) -> Self {
        Self {
            limit,
            window,
            count: 0,
            window_start: start,
        }
    }

    /// Count one message now. Returns `false` once the limit is exceeded.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    /// Count one message at `now`.
    pub fn check_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) >= self.window {
            self.count = 0;
            self.window_start = now;
        }

        self.count += 1;
        self.count <= self.limit
    }
}
