//! Channel PRIVMSG fan-out.

use super::super::ChannelActor;
use crate::network::ConnectionId;
use std::sync::Arc;

impl ChannelActor {
    pub(crate) fn handle_message(&mut self, conn: ConnectionId, line: Arc<str>) {
        let sent = self.broadcast(&line, Some(conn));
        crate::metrics::message_relayed();
        crate::metrics::record_fanout(sent);
    }
}
