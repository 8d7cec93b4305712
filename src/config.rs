//! Client configuration

use url::Url;

use crate::error::{Error, Result};

/// Default REST request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default capacity of the realtime event queue
pub const DEFAULT_EVENT_QUEUE_SIZE: usize = 1000;

/// Configuration for a [`crate::rest::RocketChatClient`] and its realtime socket
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URL (e.g., "https://open.rocket.chat")
    pub server_url: String,
    /// Timeout for REST requests, in seconds
    pub timeout_secs: u64,
    /// Optional User-Agent header for REST requests
    pub user_agent: Option<String>,
    /// Maximum number of realtime events to queue before dropping
    pub event_queue_size: usize,
}

impl ClientConfig {
    /// Create a new configuration for `server_url`
    pub fn new(server_url: impl Into<String>) -> Self {
        ClientConfig {
            server_url: server_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            event_queue_size: DEFAULT_EVENT_QUEUE_SIZE,
        }
    }

    /// Set the REST request timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the realtime event queue size
    pub fn with_event_queue_size(mut self, size: usize) -> Self {
        self.event_queue_size = size;
        self
    }

    /// Parsed server URL, normalized to end with a slash
    pub fn server(&self) -> Result<Url> {
        let mut raw = self.server_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| Error::invalid_argument(format!("Invalid URL: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::invalid_argument(format!("Unsupported URL scheme: {other}"))),
        }
    }

    /// Base URL of the REST API (`{server}/api/v1/`)
    pub fn rest_url(&self) -> Result<Url> {
        self.server()?
            .join("api/v1/")
            .map_err(|e| Error::invalid_argument(format!("Invalid URL: {e}")))
    }

    /// URL of the realtime endpoint (`ws(s)://{server}/websocket`)
    pub fn websocket_url(&self) -> Result<String> {
        let server = self.server()?;
        let scheme = if server.scheme() == "https" { "wss" } else { "ws" };
        let rest = &server.as_str()[server.scheme().len()..];
        Ok(format!("{scheme}{rest}websocket"))
    }
}
