//! Actor Model for Channel State Management.
//!
//! Each channel runs as a `ChannelActor` on its own Tokio task. The actor
//! owns the member list and processes `ChannelEvent`s one at a time, so every
//! member observes joins, parts, and messages in the same order.
//!
//! # Lifecycle
//!
//! The registry spawns an actor on the first JOIN to an unknown name. After
//! any event that leaves the member list empty the actor stops; the registry
//! mirrors membership and drops its sender at the same point, so a later JOIN
//! starts a fresh actor.

use crate::telemetry::spans;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug};

mod handlers;
mod helpers;
mod types;

pub use types::*;

/// The Channel Actor.
///
/// Owns the state of a single channel and processes events sequentially.
pub struct ChannelActor {
    pub name: String,
    server_name: Arc<str>,
    /// In join order.
    members: Vec<Member>,
}

impl ChannelActor {
    /// Create a new Channel Actor and spawn it.
    pub fn spawn(name: String, server_name: Arc<str>, capacity: usize) -> mpsc::Sender<ChannelEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let span = spans::channel(&name);

        let actor = Self {
            name,
            server_name,
            members: Vec::new(),
        };

        tokio::spawn(actor.run(rx).instrument(span));

        tx
    }

    /// The main actor loop.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ChannelEvent>) {
        crate::metrics::add_active_channels(1);
        debug!("Channel created");

        while let Some(event) = rx.recv().await {
            self.handle_event(event);
            if self.members.is_empty() {
                break;
            }
        }

        crate::metrics::add_active_channels(-1);
        debug!("Channel empty, actor stopped");
    }

    fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Join { member } => self.handle_join(member),
            ChannelEvent::Part { conn } => self.handle_part(conn),
            ChannelEvent::Message { conn, line } => self.handle_message(conn, line),
            ChannelEvent::Quit {
                conn,
                line,
                delivered,
            } => self.handle_quit(conn, line, &delivered),
            ChannelEvent::NickChange {
                conn,
                nick,
                hostmask,
                line,
                delivered,
            } => self.handle_nick_change(conn, nick, hostmask, line, &delivered),
        }
    }

    fn position(&self, conn: crate::network::ConnectionId) -> Option<usize> {
        self.members.iter().position(|m| m.id == conn)
    }
}

#[cfg(test)]
mod tests;
