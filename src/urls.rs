//! Endpoint templates for the board service.
//!
//! All HTTP paths hang off one base URL; the push feed lives on its own
//! fixed WebSocket host. Both default to the hosted BingoSync service and
//! can be overridden for self-hosted deployments or tests.

/// Hosted service base URL.
pub const DEFAULT_BASE_URL: &str = "https://bingosync.com";
/// Hosted push-broadcast endpoint.
pub const DEFAULT_SOCKET_URL: &str = "wss://sockets.bingosync.com/broadcast";

/// URL builder bound to one service deployment.
#[derive(Debug, Clone)]
pub struct Urls {
    base: String,
    socket: String,
}

impl Urls {
    #[must_use]
    pub fn new(base: &str, socket: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
            socket: socket.to_owned(),
        }
    }

    /// Service root page, fetched once per join to harvest session cookies.
    #[must_use]
    pub fn root(&self) -> String {
        format!("{}/", self.base)
    }

    /// Push-broadcast WebSocket endpoint.
    #[must_use]
    pub fn socket(&self) -> &str {
        &self.socket
    }

    /// Current board snapshot for a room.
    #[must_use]
    pub fn board(&self, room_id: &str) -> String {
        format!("{}/room/{room_id}/board", self.base)
    }

    /// Room activity feed. `full` requests the complete history.
    #[must_use]
    pub fn feed(&self, room_id: &str, full: bool) -> String {
        format!("{}/room/{room_id}/feed?full={full}", self.base)
    }

    /// Room settings. Fetching this endpoint doubles as the disconnect
    /// signal during session teardown.
    #[must_use]
    pub fn room_settings(&self, room_id: &str) -> String {
        format!("{}/room/{room_id}/room-settings", self.base)
    }

    #[must_use]
    pub fn join_room(&self) -> String {
        format!("{}/api/join-room", self.base)
    }

    #[must_use]
    pub fn select(&self) -> String {
        format!("{}/api/select", self.base)
    }

    #[must_use]
    pub fn chat(&self) -> String {
        format!("{}/api/chat", self.base)
    }

    #[must_use]
    pub fn color(&self) -> String {
        format!("{}/api/color", self.base)
    }

    #[must_use]
    pub fn reveal(&self) -> String {
        format!("{}/api/revealed", self.base)
    }

    #[must_use]
    pub fn new_card(&self) -> String {
        format!("{}/api/new-card", self.base)
    }
}

impl Default for Urls {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_SOCKET_URL)
    }
}

#[cfg(test)]
#[path = "urls_test.rs"]
mod tests;
