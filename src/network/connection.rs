//! Connection - owns one client socket.
//!
//! Each accepted socket gets a `Connection` task with this lifecycle:
//!
//! ```text
//! Phase 1: Handshake (direct reads/writes, bypasses the registry queue)
//!    ↓  Accepted
//! Phase 2: two loops sharing one ConnectionHandle
//!    ┌───────────────────────┐          ┌──────────────────────┐
//!    │      read loop        │          │     write loop       │
//!    │  FramedRead + flood   │          │  outbound mailbox →  │
//!    │  guard → registry tx  │          │  FramedWrite (10s)   │
//!    └───────────┬───────────┘          └──────────▲───────────┘
//!                │ cancel token stops both         │ try_send
//!                ▼                                 │
//!           Registry  ───────── channels ──────────┘
//! ```
//!
//! Whatever ends the read loop, it forwards exactly one sentinel event (no
//! message) so the registry can clean up.

mod handshake;
mod lifecycle;

use crate::config::LimitsConfig;
use crate::error::DisconnectReason;
use crate::network::resolve::HostResolver;
use crate::state::RegistryEvent;
use channeld_proto::LineCodec;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{info, warn};

/// Process-unique connection identifier, assigned at accept time.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next connection id.
pub fn next_connection_id() -> ConnectionId {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Everything a connection needs from the rest of the server.
pub struct ConnectionContext {
    pub server_name: Arc<str>,
    pub registry: mpsc::Sender<RegistryEvent>,
    pub resolver: HostResolver,
    pub limits: LimitsConfig,
}

/// Cloneable handle to a connection's outbound side.
///
/// Held by the registry's `User` and by channel membership records. Sending
/// never blocks: a full mailbox closes the connection instead.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: ConnectionId,
    addr: SocketAddr,
    outbound: mpsc::Sender<Arc<str>>,
    /// First close reason; `Some` means closed.
    closed: Mutex<Option<DisconnectReason>>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound mailbox.
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            inner: Arc::new(HandleInner {
                id,
                addr,
                outbound,
                closed: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.inner.addr
    }

    /// Queue a line for the write loop.
    ///
    /// Returns `false` if the line was not queued. A full mailbox closes the
    /// connection with [`DisconnectReason::SendQueueFull`].
    pub fn send(&self, line: impl Into<Arc<str>>) -> bool {
        if self.is_closed() {
            return false;
        }

        match self.inner.outbound.try_send(line.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                crate::metrics::outbound_overflow();
                warn!(id = self.inner.id, "Outbound queue full, dropping connection");
                self.close(DisconnectReason::SendQueueFull);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Close the connection. Only the first call has any effect.
    ///
    /// Returns `true` if this call performed the close.
    pub fn close(&self, reason: DisconnectReason) -> bool {
        {
            let mut closed = self.inner.closed.lock();
            if closed.is_some() {
                return false;
            }
            *closed = Some(reason);
        }

        self.inner.cancel.cancel();
        crate::metrics::record_disconnect(reason.error_code());
        info!(id = self.inner.id, addr = %self.inner.addr, %reason, "Connection closed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.lock().is_some()
    }

    /// The reason recorded by the first [`close`](Self::close).
    pub fn close_reason(&self) -> Option<DisconnectReason> {
        *self.inner.closed.lock()
    }

    /// Resolves once the connection is closed.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancel.cancelled()
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("addr", &self.inner.addr)
            .field("closed", &self.close_reason())
            .finish()
    }
}

/// A client connection handler.
pub struct Connection {
    id: ConnectionId,
    addr: SocketAddr,
    stream: TcpStream,
    context: Arc<ConnectionContext>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        addr: SocketAddr,
        context: Arc<ConnectionContext>,
    ) -> Self {
        Self {
            id,
            addr,
            stream,
            context,
        }
    }

    /// Run the connection until it closes.
    pub async fn run(self) {
        let Self {
            id,
            addr,
            stream,
            context,
        } = self;
        let limits = &context.limits;

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LineCodec::with_max_len(limits.max_line_len));
        let mut writer = FramedWrite::new(write_half, LineCodec::new());

        let hostname = context
            .resolver
            .resolve(addr.ip(), limits.resolve_timeout())
            .await;

        let (handle, outbound_rx) = ConnectionHandle::new(id, addr, limits.outbound_queue);

        let handshake = handshake::Handshake::new(&handle, &context, hostname);
        if let Err(e) = handshake.run(&mut reader, &mut writer).await {
            info!(error = %e, code = e.error_code(), "Registration failed");
            handle.close(e.disconnect_reason());
            return;
        }

        let write_task = tokio::spawn(lifecycle::write_loop(
            writer,
            outbound_rx,
            handle.clone(),
            limits.write_timeout(),
        ));

        lifecycle::read_loop(reader, &handle, &context).await;

        let _ = write_task.await;
    }
}
