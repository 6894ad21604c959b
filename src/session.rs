//! Session controller: room join/leave, HTTP call serialization, and
//! inbound event routing.
//!
//! DESIGN
//! ======
//! [`RoomClient`] owns the cookie jar, the connection status, the board
//! cache, and the push socket for one session at a time. Status lives on a
//! watch channel and every transition is a compare-and-set on it, so a
//! racing `join` or `disconnect` resolves to exactly one winner.
//!
//! The socket delivers frames over a FIFO channel to a router task which
//! decodes them, drives the board cache (full refresh on `new-card`,
//! single-slot patch on `goal`), and forwards every decoded event to the
//! subscriber. The `Closed` sentinel takes the same disconnect path as an
//! explicit call, so unexpected drops and requested teardowns look
//! identical from the outside.
//!
//! ERROR HANDLING
//! ==============
//! No session operation returns an error; only building the production
//! HTTP client can fail, at construction. Transport failures are absorbed
//! by the retry layer and surface as `None`/empty results or a
//! `Disconnected` status; operations called in the wrong state are silent
//! no-ops. The detail goes to tracing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::board::{BoardCache, BoardFetcher, parse_settings, parse_slots};
use crate::event::{self, RoomEvent};
use crate::http::{
    HttpRequest, HttpTransport, ReqwestTransport, ResponseMode, RetryingClient, TransportError,
    cookie_jar_from_set_cookie,
};
use crate::model::{
    BoardSlot, CardIds, ConnectionStatus, PlayerColor, RoomConfig, RoomSettings,
};
use crate::payload;
use crate::socket::{SocketClient, SocketConnector, SocketEvent, TungsteniteConnector};
use crate::urls::Urls;

// =============================================================================
// CLIENT
// =============================================================================

/// Client for one room session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct RoomClient {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: RetryingClient,
    urls: Urls,
    connector: Arc<dyn SocketConnector>,
    board: BoardCache,
    status: watch::Sender<ConnectionStatus>,
    state: Mutex<SessionState>,
    subscriber: Mutex<Option<mpsc::UnboundedSender<RoomEvent>>>,
}

/// Mutable per-session state. Reset to default on every disconnect.
#[derive(Default)]
struct SessionState {
    room: Option<RoomConfig>,
    cookies: Option<String>,
    socket: Option<SocketClient>,
    /// One-shot permission for the post-join color application, which runs
    /// before status flips to `Connected`.
    color_override: bool,
}

impl RoomClient {
    /// Client against the hosted service with the production transports.
    /// Fails only when the HTTP client cannot be built (TLS backend
    /// initialization).
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self::with_transports(
            Arc::new(ReqwestTransport::new()?),
            Arc::new(TungsteniteConnector),
            Urls::default(),
        ))
    }

    /// Client with explicit transports and endpoints, for self-hosted
    /// deployments and tests.
    #[must_use]
    pub fn with_transports(
        transport: Arc<dyn HttpTransport>,
        connector: Arc<dyn SocketConnector>,
        urls: Urls,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                http: RetryingClient::new(transport),
                urls,
                connector,
                board: BoardCache::new(),
                status,
                state: Mutex::new(SessionState::default()),
                subscriber: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    /// The joined room parameters, while a session exists.
    pub async fn room(&self) -> Option<RoomConfig> {
        self.inner.state.lock().await.room.clone()
    }

    /// The session's current participant color.
    pub async fn player_color(&self) -> Option<PlayerColor> {
        self.inner.state.lock().await.room.as_ref().map(|room| room.color)
    }

    /// Register the event subscriber. At most one is active; subscribing
    /// again replaces the previous receiver.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<RoomEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.subscriber.lock().await = Some(tx);
        rx
    }

    // =========================================================================
    // JOIN / LEAVE
    // =========================================================================

    /// Join a room. Refused (returning the current status) while any
    /// connection exists. `Connected` signals full success; anything else
    /// is failure, with no partial-success state.
    pub async fn join(&self, config: RoomConfig) -> ConnectionStatus {
        let inner = &self.inner;
        let claimed = inner.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Disconnected {
                *status = ConnectionStatus::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!("join refused, a connection already exists");
            return self.status();
        }

        info!(room = %config.room_id, player = %config.player_name, "joining room");

        // Fresh cookie jar per join attempt, harvested from the root page.
        let Some(cookie_header) = inner
            .http
            .send(HttpRequest {
                url: inner.urls.root(),
                body: None,
                cookies: None,
                mode: ResponseMode::Header("set-cookie"),
            })
            .await
        else {
            return inner.abort_join("cookie harvest failed").await;
        };
        let Some(cookies) = cookie_jar_from_set_cookie(&cookie_header) else {
            return inner.abort_join("no usable session cookies").await;
        };

        let join_response = inner
            .http
            .send(HttpRequest {
                url: inner.urls.join_room(),
                body: Some(payload::join_room(
                    &config.room_id,
                    &config.player_name,
                    &config.password,
                    config.spectator,
                )),
                cookies: Some(cookies.clone()),
                mode: ResponseMode::Body,
            })
            .await;
        let Some(session_key) = join_response.filter(|response| !response.is_empty()) else {
            return inner.abort_join("join request failed").await;
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let socket = SocketClient::new(
            inner.urls.socket().to_owned(),
            session_key,
            Arc::clone(&inner.connector),
            events_tx,
        );

        {
            let mut state = inner.state.lock().await;
            state.room = Some(config.clone());
            state.cookies = Some(cookies);
            state.socket = Some(socket.clone());
        }

        if socket.start().await != ConnectionStatus::Connected {
            return inner.abort_join("push socket failed to connect").await;
        }

        tokio::spawn(route_events(Arc::clone(inner), events_rx));

        // Initial board load; Connected is not reported until it lands.
        inner.board.mark_pending();
        let fetcher = SessionFetcher {
            inner: Arc::clone(inner),
        };
        inner.board.refresh(&fetcher).await;

        {
            let mut state = inner.state.lock().await;
            state.color_override = true;
        }
        self.set_color(config.color).await;

        inner.status.send_replace(ConnectionStatus::Connected);
        info!(room = %config.room_id, "room joined");
        ConnectionStatus::Connected
    }

    /// Leave the room and close the push socket. A no-op unless Connected.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    // =========================================================================
    // ROOM OPERATIONS
    // =========================================================================

    /// Set the participant color. Permitted while Connected (or during the
    /// post-join application). The cached color is updated only when the
    /// service acknowledges with a non-empty response.
    pub async fn set_color(&self, color: PlayerColor) {
        let permitted = {
            let state = self.inner.state.lock().await;
            self.status() == ConnectionStatus::Connected || state.color_override
        };
        if !permitted {
            return;
        }

        let Some((room_id, cookies)) = self.inner.room_context().await else {
            self.inner.state.lock().await.color_override = false;
            return;
        };

        let response = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.color(),
                body: Some(payload::set_color(&room_id, color)),
                cookies: Some(cookies),
                mode: ResponseMode::Body,
            })
            .await;

        let mut state = self.inner.state.lock().await;
        if response.is_some_and(|body| !body.is_empty()) {
            if let Some(room) = state.room.as_mut() {
                room.color = color;
            }
        }
        state.color_override = false;
    }

    /// Send a chat line. Fire-and-forget, Connected-only.
    pub async fn send_chat(&self, text: &str) {
        let Some((room_id, cookies)) = self.inner.connected_context().await else {
            return;
        };
        let _ = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.chat(),
                body: Some(payload::send_chat(&room_id, text)),
                cookies: Some(cookies),
                mode: ResponseMode::Discard,
            })
            .await;
    }

    /// Reveal the board for this player. Fire-and-forget, Connected-only.
    pub async fn reveal(&self) {
        let Some((room_id, cookies)) = self.inner.connected_context().await else {
            return;
        };
        let _ = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.reveal(),
                body: Some(payload::reveal(&room_id)),
                cookies: Some(cookies),
                mode: ResponseMode::Discard,
            })
            .await;
    }

    /// Mark or unmark a slot. The request is suppressed entirely when it
    /// would not change the slot's state for the effective color:
    /// - marking on needs the color absent (or, in lockout, a blank slot);
    /// - marking off needs the color present on a non-blank slot.
    ///
    /// Repeating a select that already took effect is therefore always
    /// safe, silent, and free of network traffic.
    pub async fn select_slot(&self, position: u32, mark: bool, color: Option<PlayerColor>) {
        if self.status() != ConnectionStatus::Connected {
            return;
        }

        let Some(settings) = self.room_settings().await else {
            debug!(position, "select skipped, no settings cached");
            return;
        };

        let effective = match color {
            Some(color) => color,
            None => {
                let state = self.inner.state.lock().await;
                match state.room.as_ref() {
                    Some(room) => room.color,
                    None => return,
                }
            }
        };

        let Some(slot) = self.board_slot(position).await else {
            debug!(position, "select skipped, slot not cached");
            return;
        };

        let blank = slot.is_blank();
        let marked = slot.has_color(effective);
        let permitted = if mark {
            (!settings.is_lockout() && !marked) || (settings.is_lockout() && blank)
        } else {
            !blank && marked
        };
        if !permitted {
            debug!(position, mark, color = %effective, "select suppressed, slot already in requested state");
            return;
        }

        let Some((room_id, cookies)) = self.inner.room_context().await else {
            return;
        };
        let _ = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.select(),
                body: Some(payload::select(&room_id, position, effective, mark)),
                cookies: Some(cookies),
                mode: ResponseMode::Discard,
            })
            .await;
    }

    /// Ask the service to generate a new card. Fire-and-forget,
    /// Connected-only; the resulting `new-card` push event drives the
    /// cache refresh.
    pub async fn new_card(
        &self,
        lockout: bool,
        hide_card: bool,
        card_ids: CardIds,
        seed: Option<u32>,
        custom_json: &str,
    ) {
        let Some((room_id, cookies)) = self.inner.connected_context().await else {
            return;
        };
        let _ = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.new_card(),
                body: Some(payload::new_card(
                    &room_id, lockout, hide_card, card_ids, seed, custom_json,
                )),
                cookies: Some(cookies),
                mode: ResponseMode::Discard,
            })
            .await;
    }

    /// Fetch the room activity feed as raw JSON. `None`/empty means
    /// failure or not connected.
    pub async fn feed(&self, full: bool) -> Option<String> {
        let (room_id, cookies) = self.inner.connected_context().await?;
        self.inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.feed(&room_id, full),
                body: None,
                cookies: Some(cookies),
                mode: ResponseMode::Body,
            })
            .await
    }

    /// Cookie-bearing passthrough for endpoints this crate does not wrap.
    /// `None` when no session cookies exist or the request failed.
    pub async fn raw_request(
        &self,
        url: &str,
        want_body: bool,
        post: Option<String>,
    ) -> Option<String> {
        let cookies = { self.inner.state.lock().await.cookies.clone() }?;
        self.inner
            .http
            .send(HttpRequest {
                url: url.to_owned(),
                body: post,
                cookies: Some(cookies),
                mode: if want_body {
                    ResponseMode::Body
                } else {
                    ResponseMode::Discard
                },
            })
            .await
    }

    // =========================================================================
    // BOARD READS
    // =========================================================================

    /// All cached slots. Waits out any in-flight refresh; empty when not
    /// connected.
    pub async fn board_slots(&self) -> Vec<BoardSlot> {
        if self.status() != ConnectionStatus::Connected {
            return Vec::new();
        }
        self.inner.board.slots().await
    }

    /// One cached slot by position. Waits out any in-flight refresh.
    pub async fn board_slot(&self, position: u32) -> Option<BoardSlot> {
        if self.status() != ConnectionStatus::Connected {
            return None;
        }
        self.inner.board.slot(position).await
    }

    /// The cached room settings. Waits out any in-flight refresh.
    pub async fn room_settings(&self) -> Option<RoomSettings> {
        if self.status() != ConnectionStatus::Connected {
            return None;
        }
        self.inner.board.settings().await
    }
}

// =============================================================================
// INTERNALS
// =============================================================================

impl SessionInner {
    /// Room id plus cookie jar, while a session exists.
    async fn room_context(&self) -> Option<(String, String)> {
        let state = self.state.lock().await;
        let room_id = state.room.as_ref()?.room_id.clone();
        let cookies = state.cookies.clone()?;
        Some((room_id, cookies))
    }

    /// Like [`Self::room_context`], but only while Connected.
    async fn connected_context(&self) -> Option<(String, String)> {
        if *self.status.borrow() != ConnectionStatus::Connected {
            return None;
        }
        self.room_context().await
    }

    /// Roll back a failed join: clear partial state, end Disconnected.
    async fn abort_join(&self, reason: &str) -> ConnectionStatus {
        warn!(reason, "join failed");
        {
            let mut state = self.state.lock().await;
            *state = SessionState::default();
        }
        self.status.send_replace(ConnectionStatus::Disconnected);
        ConnectionStatus::Disconnected
    }

    /// The disconnect sequence, shared by the public call and the socket
    /// closed sentinel. Only acts when Connected.
    async fn disconnect(&self) {
        let acted = self.status.send_if_modified(|status| {
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

        info!("disconnecting from room");

        // The settings fetch doubles as the disconnect signal the service
        // listens for.
        if let Some((room_id, cookies)) = self.room_context().await {
            let _ = self
                .http
                .send(HttpRequest {
                    url: self.urls.room_settings(&room_id),
                    body: None,
                    cookies: Some(cookies),
                    mode: ResponseMode::Discard,
                })
                .await;
        }

        let socket = self.state.lock().await.socket.take();
        if let Some(socket) = socket {
            if socket.status() == ConnectionStatus::Connected {
                socket.close().await;
            }
        }

        {
            let mut state = self.state.lock().await;
            *state = SessionState::default();
        }
        self.board.clear().await;
        self.status.send_replace(ConnectionStatus::Disconnected);
        info!("disconnected");
    }
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

/// Consume socket events for one session: drive the cache, forward to the
/// subscriber, and self-heal on unexpected closure. Exits when the socket
/// side of the channel is gone.
async fn route_events(inner: Arc<SessionInner>, mut events: mpsc::UnboundedReceiver<SocketEvent>) {
    while let Some(socket_event) = events.recv().await {
        match socket_event {
            SocketEvent::Closed => {
                // Same path as an explicit disconnect; a no-op when the
                // closure was requested and teardown already runs.
                inner.disconnect().await;
            }
            SocketEvent::Frame(text) => {
                if *inner.status.borrow() == ConnectionStatus::Disconnected {
                    continue;
                }
                let Some(room_event) = event::decode(&text) else {
                    trace!("dropping undecodable push frame");
                    continue;
                };

                if room_event.is_new_card() {
                    debug!("new card announced, scheduling board refresh");
                    inner.board.mark_pending();
                    let refresh_inner = Arc::clone(&inner);
                    tokio::spawn(async move {
                        let fetcher = SessionFetcher {
                            inner: Arc::clone(&refresh_inner),
                        };
                        refresh_inner.board.refresh(&fetcher).await;
                    });
                } else if let Some(square) = room_event.goal_square() {
                    inner.board.patch(square).await;
                }

                let subscriber = inner.subscriber.lock().await;
                if let Some(tx) = subscriber.as_ref() {
                    let _ = tx.send(room_event);
                }
            }
        }
    }
}

// =============================================================================
// BOARD FETCH
// =============================================================================

/// Fetches the two refresh pieces through the session's cookie jar.
struct SessionFetcher {
    inner: Arc<SessionInner>,
}

#[async_trait]
impl BoardFetcher for SessionFetcher {
    async fn settings(&self) -> Option<RoomSettings> {
        let (room_id, cookies) = self.inner.room_context().await?;
        let body = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.room_settings(&room_id),
                body: None,
                cookies: Some(cookies),
                mode: ResponseMode::Body,
            })
            .await?;
        parse_settings(&body)
    }

    async fn slots(&self) -> Option<Vec<BoardSlot>> {
        let (room_id, cookies) = self.inner.room_context().await?;
        let body = self
            .inner
            .http
            .send(HttpRequest {
                url: self.inner.urls.board(&room_id),
                body: None,
                cookies: Some(cookies),
                mode: ResponseMode::Body,
            })
            .await?;
        parse_slots(&body)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
