//! Persistent push-channel client.
//!
//! DESIGN
//! ======
//! One client owns one connection for its whole life; there is no
//! auto-reconnect, a new session builds a new client. Status moves through
//! a watch channel (`Disconnected` → `Connecting` → `Connected` →
//! `Disconnecting` → `Disconnected`) so `start()` and `close()` can await
//! transitions instead of polling.
//!
//! The receive loop delivers decoded non-empty text frames over an
//! unbounded FIFO channel, so the session router observes frames strictly
//! in arrival order. Every teardown path, requested or not, funnels into
//! the same shutdown sequence and ends with the [`SocketEvent::Closed`]
//! sentinel so upstream logic reacts identically to both.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::model::ConnectionStatus;

/// Consecutive receive failures tolerated before the loop gives up.
const MAX_READ_FAILURES: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_secs(1);

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("stream ended")]
    Ended,
}

/// One item delivered to the session router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A non-empty text frame, in arrival order.
    Frame(String),
    /// The connection is gone, whether requested or not.
    Closed,
}

/// One frame read off the underlying link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFrame {
    Text(String),
    Close,
    /// Ping/pong/binary noise; counts as a successful read.
    Other,
}

/// An established connection: send, receive, close.
#[async_trait]
pub trait SocketLink: Send {
    async fn send_text(&mut self, text: &str) -> Result<(), SocketError>;
    async fn recv(&mut self) -> Result<LinkFrame, SocketError>;
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Opens links. The seam between the state machine and tungstenite.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketLink>, SocketError>;
}

// =============================================================================
// TUNGSTENITE TRANSPORT
// =============================================================================

pub struct TungsteniteConnector;

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketLink>, SocketError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|error| SocketError::Connect(error.to_string()))?;
        Ok(Box::new(TungsteniteLink { stream }))
    }
}

struct TungsteniteLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl SocketLink for TungsteniteLink {
    async fn send_text(&mut self, text: &str) -> Result<(), SocketError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|error| SocketError::Send(error.to_string()))
    }

    async fn recv(&mut self) -> Result<LinkFrame, SocketError> {
        match self.stream.next().await {
            None => Err(SocketError::Ended),
            Some(Err(error)) => Err(SocketError::Receive(error.to_string())),
            Some(Ok(Message::Text(text))) => Ok(LinkFrame::Text(text.to_string())),
            Some(Ok(Message::Close(_))) => Ok(LinkFrame::Close),
            Some(Ok(_)) => Ok(LinkFrame::Other),
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.stream
            .close(None)
            .await
            .map_err(|error| SocketError::Send(error.to_string()))
    }
}

// =============================================================================
// SOCKET CLIENT
// =============================================================================

/// Single-use push-channel client. Connects, authenticates with the session
/// key, then feeds frames to the event channel until closed.
#[derive(Clone)]
pub struct SocketClient {
    shared: Arc<Shared>,
}

struct Shared {
    url: String,
    session_key: String,
    connector: Arc<dyn SocketConnector>,
    status: watch::Sender<ConnectionStatus>,
    events: mpsc::UnboundedSender<SocketEvent>,
    close_signal: Notify,
    started: AtomicBool,
}

impl SocketClient {
    #[must_use]
    pub fn new(
        url: String,
        session_key: String,
        connector: Arc<dyn SocketConnector>,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            shared: Arc::new(Shared {
                url,
                session_key,
                connector,
                status,
                events,
                close_signal: Notify::new(),
                started: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Connect and authenticate. Resolves once status has left
    /// `Connecting`: `Connected` on success, `Disconnected` on failure.
    /// A no-op returning the current status if this client was already
    /// started; spent clients stay `Disconnected`.
    pub async fn start(&self) -> ConnectionStatus {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return self.status();
        }

        let claimed = self.shared.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Disconnected {
                *status = ConnectionStatus::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return self.status();
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.run().await;
        });

        let mut status_rx = self.shared.status.subscribe();
        loop {
            let current = *status_rx.borrow_and_update();
            if current != ConnectionStatus::Connecting {
                return current;
            }
            if status_rx.changed().await.is_err() {
                return ConnectionStatus::Disconnected;
            }
        }
    }

    /// Graceful close. Only acts while `Connected`; resolves once the
    /// receive loop has finished the handshake and emitted the sentinel.
    pub async fn close(&self) {
        let acted = self.shared.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Connected {
                *status = ConnectionStatus::Disconnecting;
                true
            } else {
                false
            }
        });
        if !acted {
            return;
        }

        self.shared.close_signal.notify_one();

        let mut status_rx = self.shared.status.subscribe();
        loop {
            if *status_rx.borrow_and_update() == ConnectionStatus::Disconnected {
                return;
            }
            if status_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Shared {
    /// Connect sequence plus receive loop; owns the link for its lifetime.
    async fn run(&self) {
        let mut link = match self.connector.connect(&self.url).await {
            Ok(link) => link,
            Err(error) => {
                warn!(%error, url = %self.url, "socket connect failed");
                self.status.send_replace(ConnectionStatus::Disconnected);
                return;
            }
        };

        // The session key must be the first frame on the channel.
        if let Err(error) = link.send_text(&self.session_key).await {
            warn!(%error, "session key send failed");
            self.status.send_replace(ConnectionStatus::Disconnected);
            return;
        }

        let promoted = self.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Connecting {
                *status = ConnectionStatus::Connected;
                true
            } else {
                false
            }
        });
        if !promoted {
            self.status.send_replace(ConnectionStatus::Disconnected);
            return;
        }

        info!(url = %self.url, "socket connected");
        self.receive_loop(link.as_mut()).await;
        self.shutdown(link.as_mut()).await;
    }

    async fn receive_loop(&self, link: &mut dyn SocketLink) {
        let mut failures = 0_u32;

        while *self.status.borrow() == ConnectionStatus::Connected {
            let frame = tokio::select! {
                () = self.close_signal.notified() => break,
                frame = link.recv() => frame,
            };

            match frame {
                Ok(LinkFrame::Text(text)) => {
                    failures = 0;
                    if !text.is_empty() {
                        // Receiver gone means the session is tearing down.
                        if self.events.send(SocketEvent::Frame(text)).is_err() {
                            break;
                        }
                    }
                }
                Ok(LinkFrame::Other) => {
                    failures = 0;
                }
                Ok(LinkFrame::Close) => {
                    debug!("peer sent close frame");
                    break;
                }
                Err(error) => {
                    failures += 1;
                    if failures >= MAX_READ_FAILURES {
                        warn!(%error, failures, "receive failed, giving up");
                        break;
                    }
                    debug!(%error, failures, "receive failed, retrying");
                    tokio::time::sleep(READ_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Common teardown for every exit path: best-effort close handshake,
    /// terminal status, closed sentinel.
    async fn shutdown(&self, link: &mut dyn SocketLink) {
        self.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Connected {
                *status = ConnectionStatus::Disconnecting;
                true
            } else {
                false
            }
        });

        if let Err(error) = link.close().await {
            debug!(%error, "close handshake failed");
        }

        self.status.send_replace(ConnectionStatus::Disconnected);
        let _ = self.events.send(SocketEvent::Closed);
        info!("socket closed");
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
