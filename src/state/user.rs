//! Registered user record, owned by the registry.

use super::RegistrationRequest;
use crate::network::{ConnectionHandle, ConnectionId};
use std::collections::HashSet;

/// A client that completed registration.
#[derive(Debug)]
pub struct User {
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub hostname: String,
    pub handle: ConnectionHandle,
    /// Casefolded keys of joined channels.
    pub channels: HashSet<String>,
}

impl User {
    pub fn new(request: RegistrationRequest) -> Self {
        let RegistrationRequest {
            handle,
            nick,
            username,
            realname,
            hostname,
        } = request;

        Self {
            nick,
            username,
            realname,
            hostname,
            handle,
            channels: HashSet::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// `nick!user@host`
    pub fn hostmask(&self) -> String {
        format!("{}!{}@{}", self.nick, self.username, self.hostname)
    }
}
