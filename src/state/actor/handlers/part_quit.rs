//! PART and QUIT event handling.
//!
//! Removes users from channels and broadcasts departure messages.

use super::super::{ChannelActor, DeliverySet};
use crate::network::ConnectionId;
use channeld_proto::Message;
use std::sync::Arc;
use tracing::debug;

impl ChannelActor {
    pub(crate) fn handle_part(&mut self, conn: ConnectionId) {
        let Some(index) = self.position(conn) else {
            debug!(conn, "PART from non-member ignored");
            return;
        };
        let member = self.members.remove(index);

        let line: Arc<str> = Message::Part {
            target: self.name.clone(),
        }
        .from_source(&member.hostmask)
        .into();

        self.broadcast(&line, None);
        member.handle.send(line);

        debug!(nick = %member.nick, members = self.members.len(), "Member parted");
    }

    pub(crate) fn handle_quit(&mut self, conn: ConnectionId, line: Arc<str>, delivered: &DeliverySet) {
        let Some(index) = self.position(conn) else {
            return;
        };
        let member = self.members.remove(index);

        let sent = self.broadcast_once(&line, delivered);
        debug!(nick = %member.nick, notified = sent, "Member quit");
    }
}
