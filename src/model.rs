//! Core data model: player colors, board slots, room settings.
//!
//! Slot state arrives from the service in a compact wire form
//! (`{"name": ..., "slot": "slot7", "colors": "red blue"}`) and is decoded
//! into [`BoardSlot`] here. The color list keeps unrecognized or blank
//! entries as `None` so a slot marked by an unknown client version still
//! round-trips without losing its other marks.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CONNECTION STATUS
// =============================================================================

/// Lifecycle of a session (and of the underlying push socket).
///
/// Transitions only move forward through the cycle: `Disconnected` →
/// `Connecting` → `Connected` → `Disconnecting` → `Disconnected`. A failed
/// connect falls straight back to `Disconnected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionStatus {
    /// True when any connection activity exists, established or in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        self != Self::Disconnected
    }
}

// =============================================================================
// PLAYER COLOR
// =============================================================================

/// The participant colors the board service accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Orange,
    Red,
    Blue,
    Green,
    Purple,
    Navy,
    Teal,
    Brown,
    Pink,
    Yellow,
}

impl PlayerColor {
    /// Lowercase wire form, as the API expects in request bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Navy => "navy",
            Self::Teal => "teal",
            Self::Brown => "brown",
            Self::Pink => "pink",
            Self::Yellow => "yellow",
        }
    }

    /// Parse one color word, case-insensitively. Unknown words are `None`.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "orange" => Some(Self::Orange),
            "red" => Some(Self::Red),
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "purple" => Some(Self::Purple),
            "navy" => Some(Self::Navy),
            "teal" => Some(Self::Teal),
            "brown" => Some(Self::Brown),
            "pink" => Some(Self::Pink),
            "yellow" => Some(Self::Yellow),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BOARD SLOT
// =============================================================================

/// Wire form of one board cell, used both in board snapshots and inside
/// `goal` push events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WireSlot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub colors: String,
}

/// One decoded cell of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSlot {
    /// Numeric position, top-left to bottom-right, parsed from `"slot<N>"`.
    pub position: u32,
    /// Free-text label shown on the cell.
    pub label: String,
    /// Marks in service order. A blank cell is the single entry `None`;
    /// unrecognized color words also decode to `None`.
    pub colors: Vec<Option<PlayerColor>>,
}

impl BoardSlot {
    /// Decode a wire slot. `None` when the slot identifier is malformed.
    #[must_use]
    pub fn from_wire(wire: &WireSlot) -> Option<Self> {
        let position = parse_slot_position(&wire.slot)?;
        Some(Self {
            position,
            label: wire.name.clone(),
            colors: parse_colors(&wire.colors),
        })
    }

    /// A slot is blank when its color list carries the empty sentinel.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.colors.contains(&None)
    }

    /// Whether `color` is currently marked on this slot.
    #[must_use]
    pub fn has_color(&self, color: PlayerColor) -> bool {
        self.colors.contains(&Some(color))
    }
}

/// Parse the numeric position out of a `"slot<N>"` identifier.
#[must_use]
pub fn parse_slot_position(slot: &str) -> Option<u32> {
    slot.strip_prefix("slot")?.parse().ok()
}

/// Decode the space-separated color list. `"blank"` is the empty sentinel.
#[must_use]
pub fn parse_colors(colors: &str) -> Vec<Option<PlayerColor>> {
    if colors == "blank" {
        return vec![None];
    }
    colors.split(' ').map(PlayerColor::from_word).collect()
}

// =============================================================================
// ROOM SETTINGS
// =============================================================================

/// Room settings as served by the settings endpoint. Replaced wholesale on
/// every full board refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub game_id: i64,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub variant_id: i64,
    /// Mode string; lockout is active only for the exact value `"Lockout"`.
    #[serde(default)]
    pub lockout_mode: String,
    #[serde(default)]
    pub hide_card: bool,
    #[serde(default)]
    pub seed: i64,
}

impl RoomSettings {
    /// Whether the room claims slots exclusively for the first marker.
    #[must_use]
    pub fn is_lockout(&self) -> bool {
        self.lockout_mode == "Lockout"
    }
}

// =============================================================================
// ROOM CONFIG
// =============================================================================

/// Parameters for joining a room. The color is the only field that changes
/// after a successful join (via the color-set operation or inbound events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    pub room_id: String,
    pub password: String,
    pub player_name: String,
    pub color: PlayerColor,
    pub spectator: bool,
}

/// Game/variant identifier pair used when generating a new card. Looked up
/// once out of band; the pair is stable for a given game listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardIds {
    pub game_id: i64,
    pub variant_id: i64,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
