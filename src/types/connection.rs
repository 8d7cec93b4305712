//! Realtime connection state

use serde::{Deserialize, Serialize};

/// State of the realtime (DDP) connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Socket is being opened and the DDP handshake sent
    Connecting,
    /// DDP session established, resume login sent
    Authenticating,
    /// Logged in; subscriptions can be made
    Connected,
    /// Connection is being closed
    Disconnecting,
    /// Not connected
    #[default]
    Disconnected,
    /// Connection failed or encountered an error
    Error,
}

impl ConnectionState {
    /// Check if the connection is usable for subscriptions
    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    /// Check if a connection attempt is in progress
    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Authenticating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_states() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(ConnectionState::Authenticating.is_connecting());
        assert!(!ConnectionState::Error.is_connecting());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ConnectionState::Authenticating).unwrap();
        assert_eq!(json, "\"authenticating\"");
    }
}
