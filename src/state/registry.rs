//! Registry - the single dispatcher for client events.
//!
//! One task owns the nick index, the user map, and the channel map. Every
//! post-registration line from every connection arrives through one ordered
//! queue, together with registration requests from handshakes and the
//! disconnect sentinels from read loops.

use super::User;
use super::actor::{ChannelActor, ChannelEvent, DeliverySet, Member};
use crate::config::LimitsConfig;
use crate::error::DisconnectReason;
use crate::network::{ConnectionHandle, ConnectionId};
use crate::telemetry::{CommandTimer, spans};
use channeld_proto::{ChannelExt, Message, Response, irc_eq, irc_to_lower};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, warn};

/// Reason used when a connection drops without QUIT.
const EOF_REASON: &str = "EOF from client.";
/// Reason used for a bare QUIT.
const DEFAULT_QUIT_REASON: &str = "Leaving";
/// Token of the PING sent after the MOTD.
const PING_TOKEN: &str = "12345";

/// Events consumed by the registry.
#[derive(Debug)]
pub enum RegistryEvent {
    /// Handshake asking to claim a nick.
    Register {
        request: RegistrationRequest,
        reply: oneshot::Sender<RegistrationReply>,
    },
    /// Line from a registered connection; `None` is the disconnect sentinel.
    Client {
        conn: ConnectionId,
        message: Option<Message>,
    },
}

/// Credentials gathered by a handshake.
#[derive(Debug)]
pub struct RegistrationRequest {
    pub handle: ConnectionHandle,
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub hostname: String,
}

#[derive(Debug)]
pub enum RegistrationReply {
    Accepted,
    /// Nick too long or in use; `reply` is the 432/433 to show the client.
    Rejected { reply: Message },
}

/// Registry-side view of a live channel.
struct ChannelEntry {
    /// Display name, as first joined.
    name: String,
    tx: mpsc::Sender<ChannelEvent>,
    /// Mirrors the actor's member list.
    members: HashSet<ConnectionId>,
}

pub struct Registry {
    server_name: Arc<str>,
    motd: Vec<String>,
    channel_capacity: usize,
    max_nick_len: usize,
    max_channel_len: usize,
    users: HashMap<ConnectionId, User>,
    /// Casefolded nick → connection.
    nicks: HashMap<String, ConnectionId>,
    /// Casefolded channel name → entry.
    channels: HashMap<String, ChannelEntry>,
}

impl Registry {
    pub fn new(server_name: Arc<str>, motd: Vec<String>, limits: &LimitsConfig) -> Self {
        Self {
            server_name,
            motd,
            channel_capacity: limits.channel_mailbox,
            max_nick_len: limits.max_nick_len,
            max_channel_len: limits.max_channel_len,
            users: HashMap::new(),
            nicks: HashMap::new(),
            channels: HashMap::new(),
        }
    }

    /// Spawn the dispatcher, returning its inbound queue.
    pub fn spawn(self, capacity: usize) -> mpsc::Sender<RegistryEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(self.run(rx).instrument(spans::registry()));
        tx
    }

    /// Process events until every sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RegistryEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(event).await;
        }
        debug!("Registry queue closed");
    }

    async fn dispatch(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Register { request, reply } => {
                let _timer = CommandTimer::new("REGISTER");
                self.handle_register(request, reply);
            }
            RegistryEvent::Client {
                conn,
                message: None,
            } => {
                let _timer = CommandTimer::new("DISCONNECT");
                self.disconnect(conn, EOF_REASON, DisconnectReason::Eof).await;
            }
            RegistryEvent::Client {
                conn,
                message: Some(message),
            } => {
                let _timer = CommandTimer::new(message.command_name());
                self.handle_message(conn, message).await;
            }
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn handle_register(
        &mut self,
        request: RegistrationRequest,
        reply: oneshot::Sender<RegistrationReply>,
    ) {
        if request.nick.len() > self.max_nick_len {
            let numeric = Response::err_erroneusnickname(&self.server_name, "*", &request.nick);
            let _ = reply.send(RegistrationReply::Rejected { reply: numeric });
            return;
        }

        let key = irc_to_lower(&request.nick);
        if self.nicks.contains_key(&key) {
            let numeric = Response::err_nicknameinuse(&self.server_name, "*", &request.nick);
            let _ = reply.send(RegistrationReply::Rejected { reply: numeric });
            return;
        }

        let user = User::new(request);

        // Queued before the handshake resumes, so the MOTD precedes any reply
        // to the client's later lines.
        self.send_welcome(&user);

        if reply.send(RegistrationReply::Accepted).is_err() {
            debug!(nick = %user.nick, "Handshake went away before registration completed");
            user.handle.close(DisconnectReason::HandshakeFailed);
            return;
        }

        self.nicks.insert(key, user.id());
        self.users.insert(user.id(), user);
        crate::metrics::add_connected_users(1);
    }

    fn send_welcome(&self, user: &User) {
        let server = &*self.server_name;
        let handle = &user.handle;

        handle.send(Response::rpl_motdstart(server, &user.nick).to_string());
        for line in &self.motd {
            handle.send(Response::rpl_motd(server, &user.nick, line).to_string());
        }
        handle.send(Response::rpl_endofmotd(server, &user.nick).to_string());
        handle.send(
            Message::Ping {
                token: PING_TOKEN.into(),
            }
            .to_string(),
        );
    }

    // ========================================================================
    // Client messages
    // ========================================================================

    async fn handle_message(&mut self, conn: ConnectionId, message: Message) {
        if !self.users.contains_key(&conn) {
            debug!(conn, "Message from unknown connection dropped");
            return;
        }

        match message {
            Message::Ping { token } => {
                let pong = Message::Pong { token }.from_source(&self.server_name);
                self.send_to(conn, pong);
            }
            Message::Join { target } => {
                for name in target.split(',').filter(|n| !n.is_empty()) {
                    self.join(conn, name).await;
                }
            }
            Message::Part { target } => {
                for name in target.split(',').filter(|n| !n.is_empty()) {
                    self.part(conn, name).await;
                }
            }
            Message::Private { target, text } => {
                if target.is_channel_name() {
                    self.channel_message(conn, target, text).await;
                } else {
                    self.private_message(conn, target, text);
                }
            }
            Message::Nick { name } => self.change_nick(conn, name).await,
            Message::Quit { reason } => {
                let reason = if reason.is_empty() {
                    DEFAULT_QUIT_REASON.to_string()
                } else {
                    reason
                };
                self.disconnect(conn, &reason, DisconnectReason::Quit).await;
            }
            other => {
                debug!(conn, command = other.command_name(), "Ignoring message");
            }
        }
    }

    async fn join(&mut self, conn: ConnectionId, name: &str) {
        let Some(user) = self.users.get_mut(&conn) else {
            return;
        };

        if !name.is_channel_name() || name.len() > self.max_channel_len {
            user.handle
                .send(Response::err_nosuchchannel(&self.server_name, &user.nick, name).to_string());
            return;
        }

        let key = irc_to_lower(name);
        if !user.channels.insert(key.clone()) {
            return;
        }

        let member = Member {
            id: conn,
            nick: user.nick.clone(),
            hostmask: user.hostmask(),
            handle: user.handle.clone(),
        };

        let server_name = Arc::clone(&self.server_name);
        let capacity = self.channel_capacity;
        let entry = self.channels.entry(key).or_insert_with(|| {
            info!(channel = %name, "Channel created");
            ChannelEntry {
                name: name.to_string(),
                tx: ChannelActor::spawn(name.to_string(), server_name, capacity),
                members: HashSet::new(),
            }
        });
        entry.members.insert(conn);

        deliver(&entry.name, &entry.tx, ChannelEvent::Join { member }).await;
    }

    async fn part(&mut self, conn: ConnectionId, name: &str) {
        let Some(user) = self.users.get_mut(&conn) else {
            return;
        };

        let key = irc_to_lower(name);
        let Some(entry) = self.channels.get_mut(&key) else {
            user.handle
                .send(Response::err_nosuchchannel(&self.server_name, &user.nick, name).to_string());
            return;
        };

        if !entry.members.remove(&conn) {
            user.handle
                .send(Response::err_notonchannel(&self.server_name, &user.nick, name).to_string());
            return;
        }
        user.channels.remove(&key);

        deliver(&entry.name, &entry.tx, ChannelEvent::Part { conn }).await;

        if entry.members.is_empty() {
            self.channels.remove(&key);
        }
    }

    async fn channel_message(&mut self, conn: ConnectionId, target: String, text: String) {
        let Some(user) = self.users.get(&conn) else {
            return;
        };

        let Some(entry) = self.channels.get(&irc_to_lower(&target)) else {
            user.handle
                .send(Response::err_nosuchchannel(&self.server_name, &user.nick, &target).to_string());
            return;
        };

        let line: Arc<str> = Message::Private { target, text }
            .from_source(&user.hostmask())
            .into();

        deliver(&entry.name, &entry.tx, ChannelEvent::Message { conn, line }).await;
    }

    fn private_message(&self, conn: ConnectionId, target: String, text: String) {
        let Some(user) = self.users.get(&conn) else {
            return;
        };

        let recipient = self
            .nicks
            .get(&irc_to_lower(&target))
            .and_then(|id| self.users.get(id));

        match recipient {
            Some(recipient) => {
                let line = Message::Private { target, text }.from_source(&user.hostmask());
                recipient.handle.send(line);
                crate::metrics::message_relayed();
            }
            None => {
                user.handle
                    .send(Response::err_nosuchnick(&self.server_name, &user.nick, &target).to_string());
            }
        }
    }

    async fn change_nick(&mut self, conn: ConnectionId, new_nick: String) {
        let Some(user) = self.users.get_mut(&conn) else {
            return;
        };

        if user.nick == new_nick {
            return;
        }

        if new_nick.len() > self.max_nick_len {
            user.handle.send(
                Response::err_erroneusnickname(&self.server_name, &user.nick, &new_nick)
                    .to_string(),
            );
            return;
        }

        let new_key = irc_to_lower(&new_nick);
        if !irc_eq(&user.nick, &new_nick) && self.nicks.contains_key(&new_key) {
            user.handle.send(
                Response::err_nicknameinuse(&self.server_name, &user.nick, &new_nick).to_string(),
            );
            return;
        }

        let old_key = irc_to_lower(&user.nick);
        let line: Arc<str> = Message::Nick {
            name: new_nick.clone(),
        }
        .from_source(&user.hostmask())
        .into();

        info!(old = %user.nick, new = %new_nick, "Nick changed");
        self.nicks.remove(&old_key);
        self.nicks.insert(new_key, conn);
        user.nick = new_nick;

        user.handle.send(Arc::clone(&line));

        let hostmask = user.hostmask();
        let delivered: DeliverySet = Arc::new(Mutex::new(HashSet::from([conn])));
        for key in &user.channels {
            let Some(entry) = self.channels.get(key) else {
                continue;
            };
            let event = ChannelEvent::NickChange {
                conn,
                nick: user.nick.clone(),
                hostmask: hostmask.clone(),
                line: Arc::clone(&line),
                delivered: Arc::clone(&delivered),
            };
            deliver(&entry.name, &entry.tx, event).await;
        }
    }

    /// Remove a user and notify its channels. Unknown connections are ignored.
    async fn disconnect(&mut self, conn: ConnectionId, reason: &str, close: DisconnectReason) {
        let Some(user) = self.users.remove(&conn) else {
            return;
        };

        let key = irc_to_lower(&user.nick);
        if self.nicks.get(&key) == Some(&conn) {
            self.nicks.remove(&key);
        }
        crate::metrics::add_connected_users(-1);

        let line: Arc<str> = Message::Quit {
            reason: reason.to_string(),
        }
        .from_source(&user.hostmask())
        .into();
        let delivered: DeliverySet = Arc::new(Mutex::new(HashSet::from([conn])));

        for key in &user.channels {
            let Some(entry) = self.channels.get_mut(key) else {
                continue;
            };
            entry.members.remove(&conn);

            let event = ChannelEvent::Quit {
                conn,
                line: Arc::clone(&line),
                delivered: Arc::clone(&delivered),
            };
            deliver(&entry.name, &entry.tx, event).await;

            if entry.members.is_empty() {
                self.channels.remove(key);
            }
        }

        user.handle.close(close);
        info!(nick = %user.nick, %reason, "User left");
    }

    fn send_to(&self, conn: ConnectionId, line: impl Into<Arc<str>>) {
        if let Some(user) = self.users.get(&conn) {
            user.handle.send(line);
        }
    }
}

/// Hand an event to a channel actor, waiting only if its mailbox is full.
async fn deliver(channel: &str, tx: &mpsc::Sender<ChannelEvent>, event: ChannelEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            crate::metrics::channel_mailbox_overflow();
            warn!(%channel, "Channel mailbox full, waiting for space");
            if tx.send(event).await.is_err() {
                warn!(%channel, "Channel actor stopped");
            }
        }
        Err(TrySendError::Closed(_)) => {
            warn!(%channel, "Channel actor stopped");
        }
    }
}
