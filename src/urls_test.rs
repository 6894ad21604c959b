use super::*;

#[test]
fn default_urls_point_at_hosted_service() {
    let urls = Urls::default();
    assert_eq!(urls.root(), "https://bingosync.com/");
    assert_eq!(urls.socket(), "wss://sockets.bingosync.com/broadcast");
}

#[test]
fn base_url_trailing_slash_is_normalized() {
    let urls = Urls::new("https://boards.example.com/", "wss://push.example.com/broadcast");
    assert_eq!(urls.root(), "https://boards.example.com/");
    assert_eq!(
        urls.board("abc123"),
        "https://boards.example.com/room/abc123/board"
    );
}

#[test]
fn room_paths_embed_the_room_id() {
    let urls = Urls::default();
    assert_eq!(urls.board("r1"), "https://bingosync.com/room/r1/board");
    assert_eq!(
        urls.room_settings("r1"),
        "https://bingosync.com/room/r1/room-settings"
    );
}

#[test]
fn feed_url_carries_the_full_flag() {
    let urls = Urls::default();
    assert_eq!(urls.feed("r1", false), "https://bingosync.com/room/r1/feed?full=false");
    assert_eq!(urls.feed("r1", true), "https://bingosync.com/room/r1/feed?full=true");
}

#[test]
fn api_paths_are_fixed() {
    let urls = Urls::default();
    assert_eq!(urls.join_room(), "https://bingosync.com/api/join-room");
    assert_eq!(urls.select(), "https://bingosync.com/api/select");
    assert_eq!(urls.chat(), "https://bingosync.com/api/chat");
    assert_eq!(urls.color(), "https://bingosync.com/api/color");
    assert_eq!(urls.reveal(), "https://bingosync.com/api/revealed");
    assert_eq!(urls.new_card(), "https://bingosync.com/api/new-card");
}
