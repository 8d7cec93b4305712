use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorCode, Result};
use crate::types::Token;

use super::token::{MemoryTokenRepository, TokenRepository};
use super::types::ErrorBody;

/// Client for the Rocket.Chat REST API
#[derive(Clone)]
pub struct RocketChatClient {
    /// HTTP client for REST API calls
    pub(crate) http_client: Client,
    config: ClientConfig,
    /// `{server}/api/v1/`
    rest_url: Url,
    /// Key under which tokens for this server are stored
    server_key: String,
    token_repository: Arc<dyn TokenRepository>,
}

impl RocketChatClient {
    /// Create a new client that keeps tokens in memory
    ///
    /// # Arguments
    /// * `config` - Client configuration (server URL, timeout, ...)
    ///
    /// # Returns
    /// A Result containing the RocketChatClient or an Error
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_token_repository(config, Arc::new(MemoryTokenRepository::new()))
    }

    /// Create a new client backed by a caller-provided token repository
    pub fn with_token_repository(
        config: ClientConfig,
        token_repository: Arc<dyn TokenRepository>,
    ) -> Result<Self> {
        let server_key = config.server()?.to_string();
        let rest_url = config.rest_url()?;

        let mut builder = Client::builder().timeout(std::time::Duration::from_secs(config.timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
            rest_url,
            server_key,
            token_repository,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalized server URL, used as the token repository key
    pub fn server_key(&self) -> &str {
        &self.server_key
    }

    /// The stored token for this server, if logged in
    pub fn token(&self) -> Option<Token> {
        self.token_repository.get(&self.server_key)
    }

    pub(crate) fn save_token(&self, token: Token) {
        self.token_repository.save(&self.server_key, token);
    }

    pub(crate) fn clear_token(&self) {
        self.token_repository.clear(&self.server_key);
    }

    /// Fail early when no token is stored
    pub(crate) fn require_token(&self) -> Result<Token> {
        self.token().ok_or_else(Error::not_logged_in)
    }

    /// Build the full API URL for a REST method
    ///
    /// # Arguments
    /// * `method` - The REST method (e.g., "chat.postMessage")
    pub fn api_url(&self, method: &str) -> Result<Url> {
        self.rest_url
            .join(method.trim_start_matches('/'))
            .map_err(|e| Error::invalid_argument(format!("Invalid API method `{method}`: {e}")))
    }

    /// Attach the auth headers when a token is stored
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request
                .header("X-User-Id", token.user_id)
                .header("X-Auth-Token", token.auth_token),
            None => request,
        }
    }

    /// Make a GET request to the REST API
    pub async fn get(&self, method: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = self.api_url(method)?;
        self.authorize(self.http_client.get(url).query(query))
            .send()
            .await
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("GET request failed: {e}")))
    }

    /// Make a POST request with a JSON body to the REST API
    pub async fn post<T: serde::Serialize>(&self, method: &str, body: &T) -> Result<reqwest::Response> {
        let url = self.api_url(method)?;
        self.authorize(self.http_client.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("POST request failed: {e}")))
    }

    /// Make a multipart POST request to the REST API
    pub async fn post_multipart(&self, method: &str, form: reqwest::multipart::Form) -> Result<reqwest::Response> {
        let url = self.api_url(method)?;
        self.authorize(self.http_client.post(url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("POST request failed: {e}")))
    }

    /// Check if the response is successful and decode the JSON body
    pub async fn handle_response<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("Failed to read response: {e}")))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| Error::parse(format!("Failed to parse response: {e}")))
        } else {
            let mut error = error_from_body(status.as_u16(), &body);
            if let Some(id) = request_id {
                error = error.with_request_id(id);
            }
            Err(error)
        }
    }
}

/// Build an [`Error`] from a non-success status and its body
pub(crate) fn error_from_body(status: u16, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| format!("API request failed with status {status}: {body}"));

    let mut error = Error::new(ErrorCode::from_http_status(status), message).with_http_status(status);
    if let Some(error_type) = parsed.error_type {
        error = error.with_error_type(error_type);
    }
    error
}
