//! User types

use serde::{Deserialize, Serialize};

/// A Rocket.Chat user as returned by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user
    #[serde(rename = "_id")]
    pub id: String,
    /// Username (unique login name)
    #[serde(default)]
    pub username: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Current presence
    #[serde(default)]
    pub status: Option<UserStatus>,
    /// Offset from UTC in hours
    #[serde(default, rename = "utcOffset")]
    pub utc_offset: Option<f32>,
}

impl User {
    /// Create a new user
    pub fn new(id: impl Into<String>) -> Self {
        User {
            id: id.into(),
            username: None,
            name: None,
            status: None,
            utc_offset: None,
        }
    }

    /// Set the username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set user status
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// The name other users see: display name, then username, then id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

/// User status/presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is online and active
    Online,
    /// User is busy (do not disturb)
    Busy,
    /// User is away/idle
    Away,
    /// User is offline
    Offline,
    /// Status is unknown
    #[default]
    #[serde(other)]
    Unknown,
}

/// The authenticated user, as returned by `me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Myself {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub emails: Vec<Email>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
}

/// Compact user reference embedded in messages and rooms (`u`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleUser {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Authentication token pair returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "authToken")]
    pub auth_token: String,
}

impl Token {
    pub fn new(user_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Token {
            user_id: user_id.into(),
            auth_token: auth_token.into(),
        }
    }
}
