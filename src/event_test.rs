use super::*;

#[test]
fn goal_event_decodes_player_and_square() {
    let text = r#"{
        "type": "goal",
        "player": {"uuid": "u-1", "name": "alice", "color": "red", "is_spectator": false},
        "square": {"name": "Collect 30 gems", "slot": "slot7", "colors": "red"},
        "color": "red",
        "remove": false,
        "timestamp": 1712345678.5,
        "room": "r1"
    }"#;

    let event = decode(text).expect("goal event should decode");
    assert_eq!(event.kind.as_deref(), Some("goal"));
    let square = event.goal_square().expect("square present");
    assert_eq!(square.slot, "slot7");
    assert_eq!(square.colors, "red");
    let player = event.player.as_ref().expect("player present");
    assert_eq!(player.name, "alice");
    assert_eq!(event.raw, text);
}

#[test]
fn new_card_event_is_recognized() {
    let event = decode(r#"{"type": "new-card", "game": "Tetris", "seed": "123"}"#)
        .expect("event should decode");
    assert!(event.is_new_card());
    assert!(event.goal_square().is_none());
}

#[test]
fn goal_without_slot_reference_yields_no_square() {
    let event = decode(r#"{"type": "goal", "square": {"name": "x", "colors": "red"}}"#)
        .expect("event should decode");
    assert!(event.goal_square().is_none());
}

#[test]
fn non_goal_event_never_yields_a_square() {
    let event = decode(r#"{"type": "chat", "square": {"slot": "slot1"}, "text": "hi"}"#)
        .expect("event should decode");
    assert!(event.goal_square().is_none());
    assert_eq!(event.text.as_deref(), Some("hi"));
}

#[test]
fn unknown_event_kind_still_decodes() {
    let event = decode(r#"{"type": "connection", "event_type": "connected"}"#)
        .expect("event should decode");
    assert_eq!(event.kind.as_deref(), Some("connection"));
    assert_eq!(event.event_type.as_deref(), Some("connected"));
    assert!(!event.is_new_card());
}

#[test]
fn garbage_frames_do_not_decode() {
    assert!(decode("not json at all").is_none());
    assert!(decode("42").is_none());
    assert!(decode("[1, 2, 3]").is_none());
    assert!(decode("\"a plain string\"").is_none());
}

#[test]
fn empty_object_decodes_with_no_kind() {
    let event = decode("{}").expect("empty object decodes");
    assert!(event.kind.is_none());
    assert!(!event.is_new_card());
}
