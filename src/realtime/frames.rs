//! DDP frames sent over the realtime socket

use serde_json::{json, Value};

/// DDP protocol versions offered on connect, preferred first
const SUPPORTED_VERSIONS: [&str; 3] = ["1", "pre2", "pre1"];

/// Collection carrying per-user notifications (rooms, subscriptions)
pub const STREAM_NOTIFY_USER: &str = "stream-notify-user";
/// Collection carrying per-room notifications (typing, deletions)
pub const STREAM_NOTIFY_ROOM: &str = "stream-notify-room";
/// Collection carrying new and edited messages of a room
pub const STREAM_ROOM_MESSAGES: &str = "stream-room-messages";

pub fn connect() -> String {
    json!({
        "msg": "connect",
        "version": SUPPORTED_VERSIONS[0],
        "support": SUPPORTED_VERSIONS,
    })
    .to_string()
}

/// Resume a REST session on the socket with its auth token
pub fn login_resume(id: &str, auth_token: &str) -> String {
    method(id, "login", json!([{ "resume": auth_token }]))
}

/// Reply to a server `ping`, echoing its id when it carried one
pub fn pong(id: Option<&str>) -> String {
    match id {
        Some(id) => json!({ "msg": "pong", "id": id }).to_string(),
        None => json!({ "msg": "pong" }).to_string(),
    }
}

pub fn rooms_changed(id: &str, user_id: &str) -> String {
    sub(id, STREAM_NOTIFY_USER, json!([format!("{user_id}/rooms-changed"), false]))
}

pub fn subscriptions_changed(id: &str, user_id: &str) -> String {
    sub(id, STREAM_NOTIFY_USER, json!([format!("{user_id}/subscriptions-changed"), false]))
}

pub fn room_messages(id: &str, room_id: &str) -> String {
    sub(id, STREAM_ROOM_MESSAGES, json!([room_id, false]))
}

/// Receive `{room_id}/typing` notifications
pub fn typing_events(id: &str, room_id: &str) -> String {
    sub(id, STREAM_NOTIFY_ROOM, json!([format!("{room_id}/typing"), false]))
}

pub fn typing(id: &str, room_id: &str, username: &str, is_typing: bool) -> String {
    method(
        id,
        STREAM_NOTIFY_ROOM,
        json!([format!("{room_id}/typing"), username, is_typing]),
    )
}

pub fn unsub(id: &str) -> String {
    json!({ "msg": "unsub", "id": id }).to_string()
}

fn method(id: &str, name: &str, params: Value) -> String {
    json!({
        "msg": "method",
        "id": id,
        "method": name,
        "params": params,
    })
    .to_string()
}

fn sub(id: &str, name: &str, params: Value) -> String {
    json!({
        "msg": "sub",
        "id": id,
        "name": name,
        "params": params,
    })
    .to_string()
}
