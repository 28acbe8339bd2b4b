//! Nick change propagation.

use super::super::{ChannelActor, DeliverySet};
use crate::network::ConnectionId;
use std::sync::Arc;

impl ChannelActor {
    pub(crate) fn handle_nick_change(
        &mut self,
        conn: ConnectionId,
        nick: String,
        hostmask: String,
        line: Arc<str>,
        delivered: &DeliverySet,
    ) {
        let Some(index) = self.position(conn) else {
            return;
        };

        let member = &mut self.members[index];
        member.nick = nick;
        member.hostmask = hostmask;

        self.broadcast_once(&line, delivered);
    }
}
