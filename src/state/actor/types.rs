use crate::network::{ConnectionHandle, ConnectionId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Connections that already received a server-wide notice (QUIT or NICK).
///
/// Shared by every channel the notice is routed through, so a peer sharing
/// several channels with the user sees it once.
pub type DeliverySet = Arc<Mutex<HashSet<ConnectionId>>>;

/// One channel member, captured when the JOIN was enqueued.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: ConnectionId,
    pub nick: String,
    pub hostmask: String,
    pub handle: ConnectionHandle,
}

/// Events that can be sent to a Channel Actor.
#[derive(Debug)]
pub enum ChannelEvent {
    /// User joining the channel.
    Join { member: Member },
    /// User leaving the channel.
    Part { conn: ConnectionId },
    /// Channel-targeted PRIVMSG, already prefixed with the sender's hostmask.
    Message { conn: ConnectionId, line: Arc<str> },
    /// User left the server.
    Quit {
        conn: ConnectionId,
        line: Arc<str>,
        delivered: DeliverySet,
    },
    /// Member renamed; `line` is `:<old hostmask> NICK <new>`.
    NickChange {
        conn: ConnectionId,
        nick: String,
        hostmask: String,
        line: Arc<str>,
        delivered: DeliverySet,
    },
}
