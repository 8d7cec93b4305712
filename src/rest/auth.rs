use crate::error::{Error, ErrorCode, Result};
use crate::types::{Myself, Token, User};

use super::client::RocketChatClient;
use super::types::{
    EmailLoginPayload, LdapLoginPayload, LoginResponse, SignupPayload, UserResponse,
    UsernameLoginPayload,
};

impl RocketChatClient {
    /// Login with username and password
    ///
    /// # Arguments
    /// * `username` - Username of the user
    /// * `password` - Password of the user
    /// * `pin` - Two-factor code, if the account requires one
    ///
    /// # Returns
    /// The issued [`Token`], which is also saved in the token repository
    pub async fn login(&self, username: &str, password: &str, pin: Option<&str>) -> Result<Token> {
        let payload = UsernameLoginPayload {
            username: username.to_string(),
            password: password.to_string(),
            pin: pin.map(str::to_string),
        };
        self.do_login(&payload).await
    }

    /// Login with email and password
    pub async fn login_with_email(&self, email: &str, password: &str, pin: Option<&str>) -> Result<Token> {
        let payload = EmailLoginPayload {
            email: email.to_string(),
            password: password.to_string(),
            pin: pin.map(str::to_string),
        };
        self.do_login(&payload).await
    }

    /// Login with username and password through LDAP
    pub async fn login_with_ldap(&self, username: &str, password: &str) -> Result<Token> {
        let payload = LdapLoginPayload {
            ldap: true,
            username: username.to_string(),
            password: password.to_string(),
            options: serde_json::json!({}),
        };
        self.do_login(&payload).await
    }

    async fn do_login<T: serde::Serialize>(&self, payload: &T) -> Result<Token> {
        let response = self.post("login", payload).await?;
        let result: LoginResponse = self.handle_response(response).await.map_err(|e| {
            if e.code == ErrorCode::NetworkError || e.code == ErrorCode::AuthenticationFailed {
                Error { code: ErrorCode::AuthenticationFailed, ..e }
            } else {
                e
            }
        })?;

        self.save_token(result.data.clone());
        Ok(result.data)
    }

    /// Resume a session with a previously issued token
    ///
    /// The token is stored and verified by fetching the current user; on
    /// failure it is cleared again.
    pub async fn login_with_token(&self, token: Token) -> Result<Myself> {
        self.save_token(token);

        match self.me().await {
            Ok(me) => Ok(me),
            Err(e) => {
                self.clear_token();
                Err(Error::new(
                    ErrorCode::AuthenticationFailed,
                    format!("Token authentication failed: {e}"),
                ))
            }
        }
    }

    /// Register a new user.
    ///
    /// This doesn't authenticate the user; call [`RocketChatClient::login`]
    /// afterwards.
    pub async fn signup(&self, email: &str, name: &str, username: &str, password: &str) -> Result<User> {
        let payload = SignupPayload {
            email: email.to_string(),
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.post("users.register", &payload).await?;
        let result: UserResponse = self.handle_response(response).await?;
        Ok(result.user)
    }

    /// Logout and forget the stored token.
    ///
    /// The local token is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        if self.token().is_none() {
            return Ok(());
        }

        let response = self.post("logout", &serde_json::json!({})).await;
        self.clear_token();

        if let Err(e) = response {
            log::warn!("Logout API call failed (local token cleared): {e}");
        }
        Ok(())
    }

    /// Check whether the stored token is still accepted by the server
    pub async fn verify_session(&self) -> bool {
        if self.token().is_none() {
            return false;
        }
        self.me().await.is_ok()
    }
}
