//! Inbound push events.
//!
//! Every frame on the push socket is a JSON object with a `type`
//! discriminator and type-specific optional fields. Frames that do not
//! decode into that shape are dropped by the session router; everything
//! that does decode is forwarded to the subscriber verbatim, whether or
//! not this crate reacts to it itself.

use serde::Deserialize;

use crate::model::WireSlot;

/// Player info attached to events that were caused by a participant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventPlayer {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_spectator: bool,
}

/// One decoded push frame. Field presence depends on `kind`: a `"goal"`
/// event fills `player` and `square`, a `"chat"` event fills `text`, and
/// so on. Unknown kinds still decode and are forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoomEvent {
    /// The `type` discriminator. Absent on malformed-but-parseable frames.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub player: Option<EventPlayer>,
    #[serde(default)]
    pub square: Option<WireSlot>,
    #[serde(default)]
    pub player_color: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub remove: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub hide_card: Option<bool>,
    #[serde(default)]
    pub is_current: Option<bool>,
    #[serde(default)]
    pub socket_key: Option<String>,
    /// The original frame text, kept for subscribers that want fields this
    /// struct does not model.
    #[serde(skip)]
    pub raw: String,
}

impl RoomEvent {
    /// Whether this event announces a regenerated card (full refresh).
    #[must_use]
    pub fn is_new_card(&self) -> bool {
        self.kind.as_deref() == Some("new-card")
    }

    /// The affected square of a `goal` event, when a slot reference is
    /// present (single-slot patch).
    #[must_use]
    pub fn goal_square(&self) -> Option<&WireSlot> {
        if self.kind.as_deref() != Some("goal") {
            return None;
        }
        self.square.as_ref().filter(|square| !square.slot.is_empty())
    }
}

/// Decode one text frame. `None` means the frame is not a JSON object of
/// the expected shape and should be dropped silently.
#[must_use]
pub fn decode(text: &str) -> Option<RoomEvent> {
    let mut event: RoomEvent = serde_json::from_str(text).ok()?;
    event.raw = text.to_owned();
    Some(event)
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
