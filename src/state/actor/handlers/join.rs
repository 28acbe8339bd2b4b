//! JOIN event handling.

use super::super::{ChannelActor, Member};
use channeld_proto::Message;
use std::sync::Arc;
use tracing::debug;

impl ChannelActor {
    pub(crate) fn handle_join(&mut self, member: Member) {
        if self.position(member.id).is_some() {
            debug!(nick = %member.nick, "Already a member, ignoring JOIN");
            return;
        }

        let line: Arc<str> = Message::Join {
            target: self.name.clone(),
        }
        .from_source(&member.hostmask)
        .into();

        let joiner = member.handle.clone();
        let nick = member.nick.clone();
        self.members.push(member);

        // Joiner included: they see their own JOIN before the name list.
        self.broadcast(&line, None);

        for reply in self.names_replies(&nick) {
            joiner.send(reply.to_string());
        }

        debug!(%nick, members = self.members.len(), "Member joined");
    }
}
