//! Post-registration read and write loops.

use super::{ConnectionContext, ConnectionHandle};
use crate::error::DisconnectReason;
use crate::network::limit::FloodGuard;
use crate::state::RegistryEvent;
use channeld_proto::{LineCodec, Message};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace, warn};

/// Forward inbound lines to the registry until the connection ends.
///
/// Always finishes by forwarding one sentinel event with no message.
pub(super) async fn read_loop<R>(
    mut reader: FramedRead<R, LineCodec>,
    handle: &ConnectionHandle,
    context: &ConnectionContext,
) where
    R: AsyncRead + Unpin,
{
    let conn = handle.id();
    let mut flood = FloodGuard::new(context.limits.flood_messages, context.limits.flood_window());

    loop {
        let next = tokio::select! {
            biased;
            _ = handle.cancelled() => break,
            next = reader.next() => next,
        };

        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                debug!(error = %e, "Read error");
                handle.close(DisconnectReason::from(&e));
                break;
            }
            None => {
                handle.close(DisconnectReason::Eof);
                break;
            }
        };

        if !flood.check() {
            warn!(limit = context.limits.flood_messages, "Flood limit exceeded");
            handle.close(DisconnectReason::Flood);
            break;
        }

        trace!(raw = %line, "Received line");
        let event = RegistryEvent::Client {
            conn,
            message: Some(Message::parse(&line)),
        };
        if context.registry.send(event).await.is_err() {
            handle.close(DisconnectReason::Shutdown);
            break;
        }
    }

    let _ = context
        .registry
        .send(RegistryEvent::Client {
            conn,
            message: None,
        })
        .await;
}

/// Drain the outbound mailbox onto the socket.
pub(super) async fn write_loop<W>(
    mut writer: FramedWrite<W, LineCodec>,
    mut outbound: mpsc::Receiver<Arc<str>>,
    handle: ConnectionHandle,
    write_timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = handle.cancelled() => break,
            line = outbound.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        match tokio::time::timeout(write_timeout, writer.send(line)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(error = %e, "Write error");
                handle.close(DisconnectReason::WriteError);
                break;
            }
            Err(_) => {
                handle.close(DisconnectReason::WriteTimeout);
                break;
            }
        }
    }
}
