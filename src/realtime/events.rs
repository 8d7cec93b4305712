//! Events decoded from DDP `changed` frames

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Message, Room, Subscription};

use super::frames::{STREAM_NOTIFY_ROOM, STREAM_NOTIFY_USER, STREAM_ROOM_MESSAGES};

/// What happened to a room or subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
}

/// An event pushed by the server on one of the subscribed streams
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// New or edited message in a room subscribed with `subscribe_room_messages`
    RoomMessage(Message),
    RoomChanged { kind: ChangeKind, room: Room },
    RoomRemoved { room_id: String },
    SubscriptionChanged { kind: ChangeKind, subscription: Subscription },
    SubscriptionRemoved { subscription_id: String },
    Typing { room_id: String, username: String, typing: bool },
}

/// `fields` of a `changed` frame
#[derive(Debug, Deserialize)]
pub(crate) struct ChangedFields {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Convert the payload of a `changed` frame into an event.
///
/// Returns `None` (after logging) for streams or payloads this client
/// doesn't understand.
pub(crate) fn convert_changed(collection: &str, fields: ChangedFields) -> Option<StreamEvent> {
    let mut args = fields.args.into_iter();
    match collection {
        STREAM_ROOM_MESSAGES => {
            let payload = args.next()?;
            match serde_json::from_value::<Message>(payload) {
                Ok(message) => Some(StreamEvent::RoomMessage(message)),
                Err(e) => {
                    log::warn!("Failed to parse streamed message for {}: {}", fields.event_name, e);
                    None
                }
            }
        }
        STREAM_NOTIFY_USER => {
            let kind = args.next()?;
            let payload = args.next()?;
            if fields.event_name.ends_with("/rooms-changed") {
                convert_room(kind.as_str()?, payload)
            } else if fields.event_name.ends_with("/subscriptions-changed") {
                convert_subscription(kind.as_str()?, payload)
            } else {
                log::debug!("Unhandled user stream event: {}", fields.event_name);
                None
            }
        }
        STREAM_NOTIFY_ROOM => {
            let room_id = fields.event_name.strip_suffix("/typing")?.to_string();
            let username = args.next()?.as_str()?.to_string();
            let typing = args.next()?.as_bool()?;
            Some(StreamEvent::Typing {
                room_id,
                username,
                typing,
            })
        }
        other => {
            log::debug!("Unhandled stream collection: {}", other);
            None
        }
    }
}

fn change_kind(kind: &str) -> Option<ChangeKind> {
    match kind {
        "inserted" => Some(ChangeKind::Inserted),
        "updated" => Some(ChangeKind::Updated),
        _ => None,
    }
}

fn document_id(payload: &Value) -> Option<String> {
    payload.get("_id")?.as_str().map(str::to_string)
}

fn convert_room(kind: &str, payload: Value) -> Option<StreamEvent> {
    if kind == "removed" {
        return document_id(&payload).map(|room_id| StreamEvent::RoomRemoved { room_id });
    }
    let kind = change_kind(kind)?;
    match serde_json::from_value::<Room>(payload) {
        Ok(room) => Some(StreamEvent::RoomChanged { kind, room }),
        Err(e) => {
            log::warn!("Failed to parse changed room: {}", e);
            None
        }
    }
}

fn convert_subscription(kind: &str, payload: Value) -> Option<StreamEvent> {
    if kind == "removed" {
        return document_id(&payload).map(|subscription_id| StreamEvent::SubscriptionRemoved { subscription_id });
    }
    let kind = change_kind(kind)?;
    match serde_json::from_value::<Subscription>(payload) {
        Ok(subscription) => Some(StreamEvent::SubscriptionChanged { kind, subscription }),
        Err(e) => {
            log::warn!("Failed to parse changed subscription: {}", e);
            None
        }
    }
}
