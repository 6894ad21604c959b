//! Board cache and refresh coordination.
//!
//! DESIGN
//! ======
//! The cache holds the last-known slots and room settings. A full refresh
//! replaces both wholesale; a patch rewrites one slot in place from a push
//! event. Readers and patches never trigger a refresh, they only wait for
//! one that is already flagged, which also keeps a patch from being
//! overwritten by a refresh snapshot fetched before it.
//!
//! Coordination is a single phase value on a watch channel instead of
//! scattered booleans: `Pending` is set the instant an update is known to
//! be coming (so readers block before the first fetch even starts), and
//! `Refreshing` is the exclusive claim. A second refresh caller finding the
//! claim taken waits for the running one rather than starting another.
//!
//! CONSISTENCY
//! ===========
//! Settings and slots are fetched by two separate requests and each piece
//! fails independently: the cache can briefly hold fresh slots next to
//! stale (cleared) settings or vice versa. That window is inherited
//! service behavior and is deliberately kept, not papered over.

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::model::{BoardSlot, RoomSettings, WireSlot, parse_colors, parse_slot_position};

// =============================================================================
// FETCH SEAM
// =============================================================================

/// Supplies the two halves of a full refresh. `None` means that piece
/// failed (transport or parse) and the cache stores the empty value for it.
#[async_trait]
pub trait BoardFetcher: Send + Sync {
    async fn settings(&self) -> Option<RoomSettings>;
    async fn slots(&self) -> Option<Vec<BoardSlot>>;
}

/// Parse the settings endpoint response: a JSON document with a nested
/// `settings` object.
#[must_use]
pub fn parse_settings(body: &str) -> Option<RoomSettings> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    serde_json::from_value(value.get("settings")?.clone()).ok()
}

/// Parse the board endpoint response: a JSON array of wire slots. Slots
/// with malformed identifiers are skipped rather than failing the board.
#[must_use]
pub fn parse_slots(body: &str) -> Option<Vec<BoardSlot>> {
    let wires: Vec<WireSlot> = serde_json::from_str(body).ok()?;
    Some(wires.iter().filter_map(BoardSlot::from_wire).collect())
}

// =============================================================================
// CACHE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshPhase {
    Idle,
    /// An update was announced but its fetches have not started yet.
    Pending,
    /// A refresh sequence holds the exclusive claim.
    Refreshing,
}

#[derive(Default)]
struct CacheContents {
    slots: Vec<BoardSlot>,
    settings: Option<RoomSettings>,
}

/// Last-known board state plus the refresh coordinator.
pub struct BoardCache {
    contents: Mutex<CacheContents>,
    phase: watch::Sender<RefreshPhase>,
}

impl BoardCache {
    #[must_use]
    pub fn new() -> Self {
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Self {
            contents: Mutex::new(CacheContents::default()),
            phase,
        }
    }

    /// Flag an incoming refresh before its fetches start, so readers stop
    /// trusting the cache immediately.
    pub fn mark_pending(&self) {
        self.phase.send_if_modified(|phase| {
            if *phase == RefreshPhase::Idle {
                *phase = RefreshPhase::Pending;
                true
            } else {
                false
            }
        });
    }

    /// Full refresh. Claims exclusivity, fetches settings and slots, and
    /// replaces both wholesale. If another refresh already holds the claim
    /// this call waits for it to finish instead of starting a second
    /// sequence.
    pub async fn refresh(&self, fetcher: &dyn BoardFetcher) {
        let claimed = self.phase.send_if_modified(|phase| {
            if *phase == RefreshPhase::Refreshing {
                false
            } else {
                *phase = RefreshPhase::Refreshing;
                true
            }
        });
        if !claimed {
            debug!("refresh already in flight, waiting for it");
            self.wait_idle().await;
            return;
        }

        let settings = fetcher.settings().await;
        let slots = fetcher.slots().await;

        {
            let mut contents = self.contents.lock().await;
            contents.settings = settings;
            contents.slots = slots.unwrap_or_default();
        }
        self.phase.send_replace(RefreshPhase::Idle);
    }

    /// Rewrite one cached slot in place from a push event. Waits out any
    /// in-flight refresh first, so the patch lands on the fresh snapshot
    /// instead of being clobbered by it. Dropped silently when the
    /// identifier is malformed or the slot is not cached yet.
    pub async fn patch(&self, square: &WireSlot) {
        let Some(position) = parse_slot_position(&square.slot) else {
            debug!(slot = %square.slot, "ignoring patch with malformed slot id");
            return;
        };

        self.wait_idle().await;
        let mut contents = self.contents.lock().await;
        if let Some(slot) = contents
            .slots
            .iter_mut()
            .find(|slot| slot.position == position)
        {
            slot.label = square.name.clone();
            slot.colors = parse_colors(&square.colors);
        }
    }

    /// Snapshot of all slots, taken once no refresh is in flight.
    pub async fn slots(&self) -> Vec<BoardSlot> {
        self.wait_idle().await;
        self.contents.lock().await.slots.clone()
    }

    /// Snapshot of one slot by position, once no refresh is in flight.
    pub async fn slot(&self, position: u32) -> Option<BoardSlot> {
        self.wait_idle().await;
        let contents = self.contents.lock().await;
        contents
            .slots
            .iter()
            .find(|slot| slot.position == position)
            .cloned()
    }

    /// Snapshot of the room settings, once no refresh is in flight.
    pub async fn settings(&self) -> Option<RoomSettings> {
        self.wait_idle().await;
        self.contents.lock().await.settings.clone()
    }

    /// Drop cached state; used when a session ends.
    pub async fn clear(&self) {
        let mut contents = self.contents.lock().await;
        *contents = CacheContents::default();
    }

    async fn wait_idle(&self) {
        let mut phase_rx = self.phase.subscribe();
        while *phase_rx.borrow_and_update() != RefreshPhase::Idle {
            if phase_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for BoardCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
