use super::{ChannelActor, DeliverySet};
use crate::network::ConnectionId;
use channeld_proto::{Message, Response};
use std::sync::Arc;

/// Longest 353 line we emit, excluding CRLF.
pub(crate) const NAMES_LINE_BUDGET: usize = 510;

impl ChannelActor {
    /// Deliver `line` to every member except `exclude`. Returns the recipient count.
    pub(crate) fn broadcast(&self, line: &Arc<str>, exclude: Option<ConnectionId>) -> usize {
        let mut sent = 0;
        for member in &self.members {
            if Some(member.id) == exclude {
                continue;
            }
            if member.handle.send(Arc::clone(line)) {
                sent += 1;
            }
        }
        sent
    }

    /// Deliver `line` to members not yet in `delivered`, marking them.
    pub(crate) fn broadcast_once(&self, line: &Arc<str>, delivered: &DeliverySet) -> usize {
        let mut sent = 0;
        for member in &self.members {
            if !delivered.lock().insert(member.id) {
                continue;
            }
            if member.handle.send(Arc::clone(line)) {
                sent += 1;
            }
        }
        sent
    }

    /// 353 lines for `client`, followed by one 366.
    pub(crate) fn names_replies(&self, client: &str) -> Vec<Message> {
        let nicks = self.members.iter().map(|m| m.nick.as_str());
        names_replies(&self.server_name, client, &self.name, nicks)
    }
}

/// Pack `nicks` into as few 353 lines as fit [`NAMES_LINE_BUDGET`].
pub(crate) fn names_replies<'a>(
    server: &str,
    client: &str,
    channel: &str,
    nicks: impl IntoIterator<Item = &'a str>,
) -> Vec<Message> {
    let overhead = Response::rpl_namreply(server, client, channel, "")
        .to_string()
        .len();

    let mut replies = Vec::new();
    let mut buf = String::new();

    for nick in nicks {
        if !buf.is_empty() && overhead + buf.len() + 1 + nick.len() > NAMES_LINE_BUDGET {
            replies.push(Response::rpl_namreply(server, client, channel, &buf));
            buf.clear();
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(nick);
    }

    if !buf.is_empty() {
        replies.push(Response::rpl_namreply(server, client, channel, &buf));
    }
    replies.push(Response::rpl_endofnames(server, client, channel));
    replies
}
