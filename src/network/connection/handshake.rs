//! Registration handshake.
//!
//! Reads lines straight off the transport until NICK and USER have both been
//! seen, then asks the registry to claim the nick and waits on a one-shot
//! reply. A rejected nick is reported to the client with the registry's
//! numeric (433 in use, 432 too long) and the cycle repeats, keeping the USER
//! fields.

use super::{ConnectionContext, ConnectionHandle};
use crate::error::HandshakeError;
use crate::state::{RegistrationReply, RegistrationRequest, RegistryEvent};
use channeld_proto::{LineCodec, Message};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace};

/// Where a connection is in registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    AwaitingCredentials,
    PendingRegistration,
    Registered,
    Failed,
}

pub(super) struct Handshake<'a> {
    handle: &'a ConnectionHandle,
    context: &'a ConnectionContext,
    hostname: String,
    state: HandshakeState,
    nick: Option<String>,
    /// (username, realname)
    user: Option<(String, String)>,
    messages_read: usize,
}

impl<'a> Handshake<'a> {
    pub(super) fn new(
        handle: &'a ConnectionHandle,
        context: &'a ConnectionContext,
        hostname: String,
    ) -> Self {
        Self {
            handle,
            context,
            hostname,
            state: HandshakeState::AwaitingCredentials,
            nick: None,
            user: None,
            messages_read: 0,
        }
    }

    /// Drive registration to `Registered` or `Failed`.
    pub(super) async fn run<R, W>(
        mut self,
        reader: &mut FramedRead<R, LineCodec>,
        writer: &mut FramedWrite<W, LineCodec>,
    ) -> Result<(), HandshakeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.negotiate(reader, writer).await;
        self.transition(match result {
            Ok(()) => HandshakeState::Registered,
            Err(_) => HandshakeState::Failed,
        });
        result
    }

    async fn negotiate<R, W>(
        &mut self,
        reader: &mut FramedRead<R, LineCodec>,
        writer: &mut FramedWrite<W, LineCodec>,
    ) -> Result<(), HandshakeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let max_attempts = self.context.limits.handshake_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.transition(HandshakeState::AwaitingCredentials);
            let request = self.collect_credentials(reader).await?;
            let nick = request.nick.clone();

            self.transition(HandshakeState::PendingRegistration);
            match self.register(request).await? {
                RegistrationReply::Accepted => {
                    info!(%nick, host = %self.hostname, "Client registered");
                    return Ok(());
                }
                RegistrationReply::Rejected { reply } => {
                    debug!(%nick, attempt, "Nickname rejected");
                    self.write_line(writer, reply.to_string()).await?;
                    self.nick = None;
                }
            }
        }

        Err(HandshakeError::TooManyAttempts(max_attempts))
    }

    /// Read until both NICK and USER are known, within the message budget.
    async fn collect_credentials<R>(
        &mut self,
        reader: &mut FramedRead<R, LineCodec>,
    ) -> Result<RegistrationRequest, HandshakeError>
    where
        R: AsyncRead + Unpin,
    {
        let budget = self.context.limits.handshake_messages;
        self.messages_read = 0;

        loop {
            if let (Some(nick), Some((username, realname))) = (&self.nick, &self.user) {
                return Ok(RegistrationRequest {
                    handle: self.handle.clone(),
                    nick: nick.clone(),
                    username: username.clone(),
                    realname: realname.clone(),
                    hostname: self.hostname.clone(),
                });
            }

            if self.messages_read >= budget {
                return Err(HandshakeError::Incomplete(budget));
            }

            let line = match reader.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(HandshakeError::Closed),
            };
            self.messages_read += 1;

            match Message::parse(&line) {
                Message::Nick { name } => self.nick = Some(name),
                Message::User {
                    username, realname, ..
                } => self.user = Some((username, realname)),
                Message::Quit { .. } => return Err(HandshakeError::Quit),
                other => {
                    debug!(command = other.command_name(), "Ignoring message before registration")
                }
            }
        }
    }

    async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationReply, HandshakeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.context
            .registry
            .send(RegistryEvent::Register {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HandshakeError::RegistryGone)?;

        reply_rx.await.map_err(|_| HandshakeError::RegistryGone)
    }

    async fn write_line<W>(
        &self,
        writer: &mut FramedWrite<W, LineCodec>,
        line: String,
    ) -> Result<(), HandshakeError>
    where
        W: AsyncWrite + Unpin,
    {
        match tokio::time::timeout(self.context.limits.write_timeout(), writer.send(line)).await {
            Ok(result) => result.map_err(HandshakeError::from),
            Err(_) => Err(HandshakeError::WriteTimeout),
        }
    }

    fn transition(&mut self, next: HandshakeState) {
        trace!(from = ?self.state, to = ?next, "Handshake state");
        self.state = next;
    }
}
