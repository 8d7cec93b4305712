//! Message types for chat communications

use serde::{Deserialize, Serialize};

use super::attachment::{self, Attachment};
use super::timestamp;
use super::user::SimpleUser;

/// A chat message as returned by the REST API and the room message stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    #[serde(rename = "_id")]
    pub id: String,
    /// Room where this message was sent
    #[serde(rename = "rid")]
    pub room_id: String,
    /// The message text
    #[serde(default, rename = "msg")]
    pub message: String,
    /// When the message was created (epoch milliseconds)
    #[serde(rename = "ts", with = "timestamp::required")]
    pub timestamp: i64,
    /// Sender of the message
    #[serde(default, rename = "u")]
    pub sender: Option<SimpleUser>,
    /// Last server-side update (epoch milliseconds)
    #[serde(default, rename = "_updatedAt", with = "timestamp::option")]
    pub updated_at: Option<i64>,
    /// When the message was last edited (if applicable)
    #[serde(default, rename = "editedAt", with = "timestamp::option")]
    pub edited_at: Option<i64>,
    #[serde(default, rename = "editedBy")]
    pub edited_by: Option<SimpleUser>,
    /// Display name override set by bots and integrations
    #[serde(default, rename = "alias")]
    pub sender_alias: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub groupable: Option<bool>,
    #[serde(default, rename = "parseUrls")]
    pub parse_urls: Option<bool>,
    #[serde(default)]
    pub urls: Option<Vec<Url>>,
    #[serde(default)]
    pub mentions: Option<Vec<SimpleUser>>,
    #[serde(default)]
    pub channels: Option<Vec<SimpleRoom>>,
    /// Rich attachments (images, quotes, author cards, ...)
    #[serde(default, deserialize_with = "attachment::decode_list", skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    /// Create a new message
    pub fn new(id: impl Into<String>, room_id: impl Into<String>, message: impl Into<String>, timestamp: i64) -> Self {
        Message {
            id: id.into(),
            room_id: room_id.into(),
            message: message.into(),
            timestamp,
            sender: None,
            updated_at: None,
            edited_at: None,
            edited_by: None,
            sender_alias: None,
            avatar: None,
            emoji: None,
            groupable: None,
            parse_urls: None,
            urls: None,
            mentions: None,
            channels: None,
            attachments: None,
        }
    }

    /// Add an attachment to this message
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.get_or_insert_with(Vec::new).push(attachment);
        self
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

/// A URL detected in a message, with optional preview metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Url {
    pub url: String,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

/// Compact room reference embedded in messages (`channels`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleRoom {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
