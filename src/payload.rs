//! Outbound JSON request bodies.
//!
//! Field names follow the remote API exactly, including `is_specator` in
//! the join body, which is the spelling the service actually checks.

use crate::model::{CardIds, PlayerColor};

#[must_use]
pub(crate) fn join_room(room: &str, nickname: &str, password: &str, spectator: bool) -> String {
    serde_json::json!({
        "room": room,
        "nickname": nickname,
        "password": password,
        "is_specator": spectator,
    })
    .to_string()
}

#[must_use]
pub(crate) fn set_color(room: &str, color: PlayerColor) -> String {
    serde_json::json!({
        "room": room,
        "color": color.as_str(),
    })
    .to_string()
}

#[must_use]
pub(crate) fn send_chat(room: &str, text: &str) -> String {
    serde_json::json!({
        "room": room,
        "text": text,
    })
    .to_string()
}

#[must_use]
pub(crate) fn reveal(room: &str) -> String {
    serde_json::json!({ "room": room }).to_string()
}

/// Body for marking or unmarking a slot. The service takes the slot as a
/// decimal string and expresses "unmark" as `remove_color`.
#[must_use]
pub(crate) fn select(room: &str, slot: u32, color: PlayerColor, mark: bool) -> String {
    serde_json::json!({
        "room": room,
        "slot": slot.to_string(),
        "color": color.as_str(),
        "remove_color": !mark,
    })
    .to_string()
}

/// Body for generating a new card. `seed` of `None` asks the service to
/// pick one; lockout is the string `"2"` and free-for-all `"1"`.
#[must_use]
pub(crate) fn new_card(
    room: &str,
    lockout: bool,
    hide_card: bool,
    card_ids: CardIds,
    seed: Option<u32>,
    custom_json: &str,
) -> String {
    serde_json::json!({
        "room": room,
        "game_type": card_ids.game_id.to_string(),
        "variant_type": card_ids.variant_id.to_string(),
        "lockout_mode": if lockout { "2" } else { "1" },
        "hide_card": hide_card,
        "seed": seed.map_or(String::new(), |value| value.to_string()),
        "custom_json": custom_json,
    })
    .to_string()
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
