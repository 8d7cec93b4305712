use reqwest::multipart;

use crate::error::{Error, Result};
use crate::types::{Myself, User};

use super::client::RocketChatClient;
use super::types::{BaseResult, ProfileData, UpdateProfilePayload, UserResponse};

/// MIME types the server accepts for avatars
const AVATAR_MIME_TYPES: [&str; 5] = ["image/gif", "image/png", "image/jpeg", "image/bmp", "image/webp"];

impl RocketChatClient {
    /// The currently logged in user.
    ///
    /// Also useful to check whether the stored token is still valid.
    pub async fn me(&self) -> Result<Myself> {
        self.require_token()?;
        let response = self.get("me", &[]).await?;
        self.handle_response(response).await
    }

    /// Update a user's profile; `None` fields are left unchanged
    pub async fn update_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        password: Option<&str>,
        username: Option<&str>,
    ) -> Result<User> {
        self.require_token()?;
        let payload = UpdateProfilePayload {
            user_id: user_id.to_string(),
            data: ProfileData {
                email: email.map(str::to_string),
                name: name.map(str::to_string),
                password: password.map(str::to_string),
                username: username.map(str::to_string),
            },
        };

        let response = self.post("users.update", &payload).await?;
        let result: UserResponse = self.handle_response(response).await?;
        Ok(result.user)
    }

    /// Reset a user's avatar to the default
    pub async fn reset_avatar(&self, user_id: &str) -> Result<bool> {
        self.require_token()?;
        let response = self
            .post("users.resetAvatar", &serde_json::json!({ "userId": user_id }))
            .await?;
        let result: BaseResult = self.handle_response(response).await?;
        Ok(result.success)
    }

    /// Set the avatar from a URL the server can fetch
    pub async fn set_avatar_url(&self, avatar_url: &str) -> Result<bool> {
        self.require_token()?;
        let response = self
            .post("users.setAvatar", &serde_json::json!({ "avatarUrl": avatar_url }))
            .await?;
        let result: BaseResult = self.handle_response(response).await?;
        Ok(result.success)
    }

    /// Upload an image as the avatar
    ///
    /// # Arguments
    /// * `data` - Image bytes
    /// * `file_name` - File name reported to the server
    /// * `mime_type` - One of gif, png, jpeg, bmp or webp
    pub async fn set_avatar_file(&self, data: Vec<u8>, file_name: &str, mime_type: &str) -> Result<bool> {
        validate_avatar_mime_type(mime_type)?;
        self.require_token()?;

        let part = multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| Error::invalid_argument(format!("Invalid image type: {e}")))?;
        let form = multipart::Form::new().part("image", part);

        let response = self.post_multipart("users.setAvatar", form).await?;
        let result: BaseResult = self.handle_response(response).await?;
        Ok(result.success)
    }
}

fn validate_avatar_mime_type(mime_type: &str) -> Result<()> {
    if AVATAR_MIME_TYPES.contains(&mime_type) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("Invalid image type: {mime_type}")))
    }
}
