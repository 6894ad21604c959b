//! Client for hosted BingoSync-style board rooms.
//!
//! One [`RoomClient`] drives one room session at a time: it joins over
//! cookie-authenticated HTTP, listens for push events on a WebSocket, and
//! keeps a local cache of the board that is refreshed or patched as events
//! arrive. All public operations absorb transport failures; callers observe
//! them as `None`/empty results or a [`ConnectionStatus`] change rather
//! than as errors.
//!
//! ```no_run
//! use roomsync::{PlayerColor, RoomClient, RoomConfig};
//!
//! # async fn run() -> Result<(), roomsync::http::TransportError> {
//! let client = RoomClient::new()?;
//! let mut events = client.subscribe().await;
//!
//! client
//!     .join(RoomConfig {
//!         room_id: "UUIDv4RoomId".to_owned(),
//!         password: "hunter2".to_owned(),
//!         player_name: "alice".to_owned(),
//!         color: PlayerColor::Red,
//!         spectator: false,
//!     })
//!     .await;
//!
//! client.select_slot(13, true, None).await;
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event.kind);
//! }
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod event;
pub mod http;
pub mod model;
mod payload;
pub mod session;
pub mod socket;
pub mod urls;

pub use event::{EventPlayer, RoomEvent};
pub use model::{
    BoardSlot, CardIds, ConnectionStatus, PlayerColor, RoomConfig, RoomSettings, WireSlot,
};
pub use session::RoomClient;
pub use urls::Urls;
