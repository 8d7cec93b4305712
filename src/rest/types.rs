use serde::{Deserialize, Serialize};

use crate::types::{Attachment, Message, Token, User};

/// Login with username and password (`login`)
#[derive(Debug, Clone, Serialize)]
pub struct UsernameLoginPayload {
    pub username: String,
    pub password: String,
    /// Two-factor code
    #[serde(rename = "code", skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// Login with email and password (`login`)
#[derive(Debug, Clone, Serialize)]
pub struct EmailLoginPayload {
    #[serde(rename = "user")]
    pub email: String,
    pub password: String,
    #[serde(rename = "code", skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// Login through the server's LDAP bridge (`login`)
#[derive(Debug, Clone, Serialize)]
pub struct LdapLoginPayload {
    pub ldap: bool,
    pub username: String,
    #[serde(rename = "ldapPass")]
    pub password: String,
    #[serde(rename = "ldapOptions")]
    pub options: serde_json::Value,
}

/// Response of `login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub data: Token,
}

/// Body of `users.register`
#[derive(Debug, Clone, Serialize)]
pub struct SignupPayload {
    pub email: String,
    pub name: String,
    pub username: String,
    #[serde(rename = "pass")]
    pub password: String,
}

/// Body of `users.update`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfilePayload {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub data: ProfileData,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Responses that wrap a single user (`users.register`, `users.update`)
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

/// Body of `chat.postMessage`
#[derive(Debug, Clone, Serialize)]
pub struct SendMessagePayload {
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl SendMessagePayload {
    pub fn new(room_id: impl Into<String>, text: impl Into<String>) -> Self {
        SendMessagePayload {
            room_id: room_id.into(),
            text: text.into(),
            alias: None,
            emoji: None,
            avatar: None,
            attachments: Vec::new(),
        }
    }

    /// Post under a different display name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Use an emoji as the avatar
    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Use an image URL as the avatar
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Body of `chat.update` and `chat.delete`
#[derive(Debug, Clone, Serialize)]
pub struct MessageRefPayload {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "msgId")]
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Responses that wrap a single message (`chat.postMessage`, `chat.update`)
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: Message,
}

/// Response of `{channels,groups,im}.history`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of `subscriptions.read`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRoomPayload {
    #[serde(rename = "rid")]
    pub room_id: String,
}

/// Paged list response (`channels.members`, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResult<T> {
    #[serde(default = "Vec::new", alias = "members")]
    pub result: Vec<T>,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub total: i64,
}

/// Bare `{"success": bool}` response
#[derive(Debug, Clone, Deserialize)]
pub struct BaseResult {
    #[serde(default)]
    pub success: bool,
}

/// Error body; the server uses two different shapes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageAttachment;
    use serde_json::json;

    #[test]
    fn test_username_login_payload() {
        let payload = UsernameLoginPayload {
            username: "testuser".to_string(),
            password: "secret".to_string(),
            pin: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"username": "testuser", "password": "secret"})
        );
    }

    #[test]
    fn test_email_login_payload_with_pin() {
        let payload = EmailLoginPayload {
            email: "test@example.com".to_string(),
            password: "secret".to_string(),
            pin: Some("123456".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"user": "test@example.com", "password": "secret", "code": "123456"})
        );
    }

    #[test]
    fn test_login_response() {
        let json = r#"{"status": "success", "data": {"authToken": "token", "userId": "userId", "me": {}}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data, Token::new("userId", "token"));
    }

    #[test]
    fn test_send_message_payload() {
        let payload = SendMessagePayload::new("GENERAL", "hello")
            .with_alias("TestingAlias")
            .with_emoji(":smirk:")
            .with_attachment(Attachment::Image(ImageAttachment::new("https://example.com/a.png")));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "roomId": "GENERAL",
                "text": "hello",
                "alias": "TestingAlias",
                "emoji": ":smirk:",
                "attachments": [{"title_link_download": false, "image_url": "https://example.com/a.png"}]
            })
        );
    }

    #[test]
    fn test_profile_payload_skips_unset() {
        let payload = UpdateProfilePayload {
            user_id: "userId".to_string(),
            data: ProfileData {
                name: Some("New Name".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"userId": "userId", "data": {"name": "New Name"}})
        );
    }

    #[test]
    fn test_members_result() {
        let json = r#"{"members": [{"_id": "u1", "username": "alice", "status": "online"}], "count": 1, "offset": 0, "total": 5, "success": true}"#;
        let result: PagedResult<User> = serde_json::from_str(json).unwrap();
        assert_eq!(result.result.len(), 1);
        assert_eq!(result.total, 5);
    }
}
