use crate::error::Result;
use crate::types::room::{combine_results, RestMultiResult};
use crate::types::timestamp::to_iso8601;
use crate::types::{ChatRoom, Room, RoomType, Subscription, User};

use super::client::RocketChatClient;
use super::types::{BaseResult, ChatRoomPayload, PagedResult};

impl RocketChatClient {
    /// Rooms the user is subscribed to, merged with their subscriptions
    ///
    /// # Arguments
    /// * `since` - Only return changes after this time (epoch milliseconds); 0 for everything
    ///
    /// # Returns
    /// Updated and removed rooms. Rooms and subscriptions are fetched concurrently.
    pub async fn chat_rooms(&self, since: i64) -> Result<RestMultiResult<ChatRoom>> {
        let (rooms, subscriptions) = futures::try_join!(self.list_rooms(since), self.list_subscriptions(since))?;
        Ok(combine_results(rooms, subscriptions))
    }

    /// `rooms.get`
    pub async fn list_rooms(&self, since: i64) -> Result<RestMultiResult<Room>> {
        self.require_token()?;
        let response = self.get("rooms.get", &since_query(since)?).await?;
        self.handle_response(response).await
    }

    /// `subscriptions.get`
    pub async fn list_subscriptions(&self, since: i64) -> Result<RestMultiResult<Subscription>> {
        self.require_token()?;
        let response = self.get("subscriptions.get", &since_query(since)?).await?;
        self.handle_response(response).await
    }

    /// Mark every message in a room as read
    pub async fn mark_as_read(&self, room_id: &str) -> Result<()> {
        self.require_token()?;
        let payload = ChatRoomPayload {
            room_id: room_id.to_string(),
        };
        let response = self.post("subscriptions.read", &payload).await?;
        let _: BaseResult = self.handle_response(response).await?;
        Ok(())
    }

    /// Members of a room, one page at a time
    pub async fn members(&self, room_id: &str, room_type: RoomType, offset: i64, count: i64) -> Result<PagedResult<User>> {
        self.require_token()?;
        let method = format!("{}.members", room_type.api_prefix());
        let query = [
            ("roomId", room_id.to_string()),
            ("offset", offset.to_string()),
            ("count", count.to_string()),
        ];
        let response = self.get(&method, &query).await?;
        self.handle_response(response).await
    }
}

/// `updatedSince` filter; omitted for a full fetch
fn since_query(since: i64) -> Result<Vec<(&'static str, String)>> {
    if since > 0 {
        Ok(vec![("updatedSince", to_iso8601(since)?)])
    } else {
        Ok(Vec::new())
    }
}
