//! Room and subscription types
//!
//! Rocket.Chat splits what a client shows as a "room" into two records: the
//! room itself (`rooms.get`) and the current user's subscription to it
//! (`subscriptions.get`). [`ChatRoom`] is the merged view.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::timestamp;
use super::user::SimpleUser;

/// Room type (`t` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    /// Public channel - "c"
    #[serde(rename = "c")]
    Channel,
    /// Private group - "p"
    #[serde(rename = "p")]
    PrivateGroup,
    /// Direct message - "d"
    #[serde(rename = "d")]
    DirectMessage,
    /// Livechat - "l"
    #[serde(rename = "l")]
    Livechat,
}

impl RoomType {
    /// Get the string representation of the room type
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Channel => "c",
            RoomType::PrivateGroup => "p",
            RoomType::DirectMessage => "d",
            RoomType::Livechat => "l",
        }
    }

    /// REST namespace for room-type specific endpoints (`channels.members`, `groups.history`, ...)
    pub fn api_prefix(&self) -> &'static str {
        match self {
            RoomType::Channel => "channels",
            RoomType::PrivateGroup => "groups",
            RoomType::DirectMessage => "im",
            RoomType::Livechat => "livechat",
        }
    }
}

/// A room as returned by `rooms.get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "t")]
    pub room_type: RoomType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "fname")]
    pub fullname: Option<String>,
    /// Owner/creator
    #[serde(default, rename = "u")]
    pub user: Option<SimpleUser>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default, rename = "ro")]
    pub read_only: bool,
    #[serde(default, rename = "_updatedAt", with = "timestamp::option")]
    pub updated_at: Option<i64>,
    #[serde(default, rename = "lastMessage")]
    pub last_message: Option<Message>,
}

/// The current user's subscription to a room, as returned by `subscriptions.get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "rid")]
    pub room_id: String,
    #[serde(rename = "t")]
    pub room_type: RoomType,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "fname")]
    pub fullname: Option<String>,
    #[serde(default, rename = "u")]
    pub user: Option<SimpleUser>,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub alert: bool,
    #[serde(default)]
    pub unread: i64,
    #[serde(default, rename = "userMentions")]
    pub user_mentions: i64,
    #[serde(default, rename = "groupMentions")]
    pub group_mentions: i64,
    #[serde(default, rename = "_updatedAt", with = "timestamp::option")]
    pub updated_at: Option<i64>,
    #[serde(default, rename = "ts", with = "timestamp::option")]
    pub timestamp: Option<i64>,
    /// Last time the user saw the room
    #[serde(default, rename = "ls", with = "timestamp::option")]
    pub last_seen: Option<i64>,
}

/// Room and subscription merged into what a client displays
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRoom {
    pub id: String,
    pub room_type: RoomType,
    pub name: String,
    pub fullname: Option<String>,
    pub user: Option<SimpleUser>,
    pub topic: Option<String>,
    pub announcement: Option<String>,
    pub read_only: bool,
    pub open: bool,
    pub alert: bool,
    pub unread: i64,
    pub user_mentions: i64,
    pub group_mentions: i64,
    pub updated_at: Option<i64>,
    pub timestamp: Option<i64>,
    pub last_seen: Option<i64>,
    pub last_message: Option<Message>,
}

impl ChatRoom {
    pub fn create(room: Room, subscription: Subscription) -> Self {
        ChatRoom {
            id: room.id,
            room_type: room.room_type,
            name: room.name.unwrap_or(subscription.name),
            fullname: room.fullname.or(subscription.fullname),
            user: room.user.or(subscription.user),
            topic: room.topic,
            announcement: room.announcement,
            read_only: room.read_only,
            open: subscription.open,
            alert: subscription.alert,
            unread: subscription.unread,
            user_mentions: subscription.user_mentions,
            group_mentions: subscription.group_mentions,
            updated_at: room.updated_at.max(subscription.updated_at),
            timestamp: subscription.timestamp,
            last_seen: subscription.last_seen,
            last_message: room.last_message,
        }
    }
}

/// Delta response of `rooms.get` and `subscriptions.get`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestMultiResult<T> {
    #[serde(default = "Vec::new")]
    pub update: Vec<T>,
    #[serde(default = "Vec::new")]
    pub remove: Vec<T>,
}

impl<T> RestMultiResult<T> {
    pub fn new(update: Vec<T>, remove: Vec<T>) -> Self {
        RestMultiResult { update, remove }
    }
}

/// Merge rooms and subscriptions by room id.
///
/// Subscriptions without a matching room are dropped; this only happens when
/// the user joins or leaves a room between the two requests.
pub fn combine(rooms: Vec<Room>, subscriptions: Vec<Subscription>) -> Vec<ChatRoom> {
    let mut by_id: HashMap<String, Room> = rooms.into_iter().map(|room| (room.id.clone(), room)).collect();

    subscriptions
        .into_iter()
        .filter_map(|subscription| {
            let room = by_id.remove(&subscription.room_id)?;
            Some(ChatRoom::create(room, subscription))
        })
        .collect()
}

/// Merge both halves of a `rooms.get` / `subscriptions.get` delta
pub fn combine_results(
    rooms: RestMultiResult<Room>,
    subscriptions: RestMultiResult<Subscription>,
) -> RestMultiResult<ChatRoom> {
    RestMultiResult::new(
        combine(rooms.update, subscriptions.update),
        combine(rooms.remove, subscriptions.remove),
    )
}
