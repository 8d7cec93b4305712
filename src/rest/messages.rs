use crate::error::Result;
use crate::types::timestamp::to_iso8601;
use crate::types::{Message, RoomType};

use super::client::RocketChatClient;
use super::types::{BaseResult, HistoryResponse, MessageRefPayload, MessageResponse, SendMessagePayload};

impl RocketChatClient {
    /// Send a message to a room
    ///
    /// # Arguments
    /// * `payload` - Room, text and optional alias/emoji/avatar/attachments
    ///
    /// # Returns
    /// The message as stored by the server
    pub async fn send_message(&self, payload: &SendMessagePayload) -> Result<Message> {
        self.require_token()?;
        let response = self.post("chat.postMessage", payload).await?;
        let result: MessageResponse = self.handle_response(response).await?;
        Ok(result.message)
    }

    /// Replace the text of a message previously sent
    pub async fn update_message(&self, room_id: &str, message_id: &str, text: &str) -> Result<Message> {
        self.require_token()?;
        let payload = MessageRefPayload {
            room_id: room_id.to_string(),
            message_id: message_id.to_string(),
            text: Some(text.to_string()),
        };
        let response = self.post("chat.update", &payload).await?;
        let result: MessageResponse = self.handle_response(response).await?;
        Ok(result.message)
    }

    /// Delete a message
    pub async fn delete_message(&self, room_id: &str, message_id: &str) -> Result<bool> {
        self.require_token()?;
        let payload = MessageRefPayload {
            room_id: room_id.to_string(),
            message_id: message_id.to_string(),
            text: None,
        };
        let response = self.post("chat.delete", &payload).await?;
        let result: BaseResult = self.handle_response(response).await?;
        Ok(result.success)
    }

    /// Latest messages of a room, newest first
    ///
    /// # Arguments
    /// * `room_id` - The room
    /// * `room_type` - Selects the `channels`/`groups`/`im` endpoint
    /// * `count` - Maximum number of messages
    /// * `latest` - Only messages before this time (epoch milliseconds)
    pub async fn history(&self, room_id: &str, room_type: RoomType, count: u32, latest: Option<i64>) -> Result<Vec<Message>> {
        self.require_token()?;
        let method = format!("{}.history", room_type.api_prefix());
        let mut query = vec![("roomId", room_id.to_string()), ("count", count.to_string())];
        if let Some(latest) = latest {
            query.push(("latest", to_iso8601(latest)?));
        }

        let response = self.get(&method, &query).await?;
        let result: HistoryResponse = self.handle_response(response).await?;
        Ok(result.messages)
    }
}
