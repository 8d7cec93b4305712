use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};

use crate::error::{Error, ErrorCode, Result};
use crate::rest::RocketChatClient;
use crate::types::ConnectionState;

use super::events::{convert_changed, ChangedFields, StreamEvent};
use super::frames;

/// Type alias for the WebSocket write half
type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Called once the server confirms (`true`) or rejects (`false`) a subscription,
/// with the subscription id
pub type SubscriptionCallback = Box<dyn Fn(bool, &str) + Send + Sync>;

/// Any frame the server sends; unused members stay `None`
#[derive(Debug, Deserialize)]
struct IncomingFrame {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    collection: Option<String>,
    /// Document fields for `added`/`changed`; only stream notifications
    /// are decoded further
    #[serde(default)]
    fields: Option<serde_json::Value>,
    /// Subscription ids of a `ready` frame
    #[serde(default)]
    subs: Vec<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// State shared between the socket handle and its read task
struct Shared {
    event_tx: mpsc::Sender<StreamEvent>,
    subscriptions: Mutex<HashMap<String, SubscriptionCallback>>,
    state: Mutex<ConnectionState>,
    /// Id of the pending resume `login` call
    login_id: Mutex<Option<String>>,
}

impl Shared {
    fn new(queue_size: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (event_tx, event_rx) = mpsc::channel(queue_size.max(1));
        let shared = Shared {
            event_tx,
            subscriptions: Mutex::new(HashMap::new()),
            state: Mutex::new(ConnectionState::Disconnected),
            login_id: Mutex::new(None),
        };
        (shared, event_rx)
    }

    async fn set_state(&self, state: ConnectionState) {
        *self.state.lock().await = state;
    }
}

/// Realtime (DDP over WebSocket) connection for a [`RocketChatClient`]
///
/// Stream events are queued on a bounded channel sized by
/// `ClientConfig::event_queue_size`; when it is full new events are dropped.
/// A dropped connection is not re-established.
pub struct Socket {
    client: RocketChatClient,
    ws_url: String,
    shared: Arc<Shared>,
    event_rx: Arc<Mutex<mpsc::Receiver<StreamEvent>>>,
    ws_writer: Arc<Mutex<Option<WsWriter>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    next_id: AtomicU64,
}

impl Socket {
    /// Create a socket for the client's server. Nothing is opened until [`Socket::connect`].
    pub fn new(client: RocketChatClient) -> Result<Self> {
        let ws_url = client.config().websocket_url()?;
        let (shared, event_rx) = Shared::new(client.config().event_queue_size);

        Ok(Socket {
            client,
            ws_url,
            shared: Arc::new(shared),
            event_rx: Arc::new(Mutex::new(event_rx)),
            ws_writer: Arc::new(Mutex::new(None)),
            shutdown_tx: None,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.ws_url
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.shared.state.lock().await
    }

    /// Next id for a DDP method call or subscription
    pub fn generate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Open the WebSocket, start the DDP session and, when the client holds
    /// a token, resume it on the socket.
    pub async fn connect(&mut self) -> Result<()> {
        self.shared.set_state(ConnectionState::Connecting).await;

        let (ws_stream, _) = match connect_async(self.ws_url.as_str()).await {
            Ok(connection) => connection,
            Err(e) => {
                self.shared.set_state(ConnectionState::Error).await;
                return Err(Error::new(ErrorCode::NetworkError, format!("WebSocket connection failed: {e}")));
            }
        };
        let (mut write, mut read) = ws_stream.split();

        let mut handshake = vec![frames::connect()];
        if let Some(token) = self.client.token() {
            let id = self.generate_id();
            handshake.push(frames::login_resume(&id, &token.auth_token));
            *self.shared.login_id.lock().await = Some(id);
        }
        for frame in handshake {
            if let Err(e) = write.send(WsMessage::Text(frame)).await {
                self.shared.set_state(ConnectionState::Error).await;
                return Err(Error::new(ErrorCode::NetworkError, format!("Failed to send handshake: {e}")));
            }
        }

        *self.ws_writer.lock().await = Some(write);
        log::info!("Realtime socket opened: {}", self.ws_url);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let shared = Arc::clone(&self.shared);
        let ws_writer = Arc::clone(&self.ws_writer);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = read.next() => {
                        match msg {
                            Some(Ok(WsMessage::Text(text))) => {
                                match Self::handle_frame(&shared, &text).await {
                                    Ok(Some(reply)) => {
                                        if let Some(writer) = ws_writer.lock().await.as_mut() {
                                            if let Err(e) = writer.send(WsMessage::Text(reply)).await {
                                                log::warn!("Failed to send reply frame: {}", e);
                                                break;
                                            }
                                        }
                                    }
                                    Ok(None) => {}
                                    Err(e) => log::warn!("Error handling realtime frame: {}", e),
                                }
                            }
                            Some(Ok(WsMessage::Ping(data))) => {
                                if let Some(writer) = ws_writer.lock().await.as_mut() {
                                    if let Err(e) = writer.send(WsMessage::Pong(data)).await {
                                        log::warn!("Failed to send pong: {}", e);
                                        break;
                                    }
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) => {
                                log::info!("Realtime socket closed by server");
                                break;
                            }
                            Some(Err(e)) => {
                                log::error!("Realtime socket error: {}", e);
                                shared.set_state(ConnectionState::Error).await;
                                break;
                            }
                            None => {
                                log::info!("Realtime socket stream ended");
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        log::debug!("Realtime socket shutdown requested");
                        if let Some(mut writer) = ws_writer.lock().await.take() {
                            let _ = writer.close().await;
                        }
                        break;
                    }
                }
            }

            *ws_writer.lock().await = None;
            let mut state = shared.state.lock().await;
            if *state != ConnectionState::Error {
                *state = ConnectionState::Disconnected;
            }
        });

        Ok(())
    }

    /// Handle one text frame from the server.
    ///
    /// # Returns
    /// A frame to send back (a `pong`), if any
    async fn handle_frame(shared: &Shared, text: &str) -> Result<Option<String>> {
        let frame: IncomingFrame = serde_json::from_str(text)?;

        match frame.msg.as_deref() {
            Some("ping") => return Ok(Some(frames::pong(frame.id.as_deref()))),
            Some("connected") => {
                let state = if shared.login_id.lock().await.is_some() {
                    ConnectionState::Authenticating
                } else {
                    ConnectionState::Connected
                };
                shared.set_state(state).await;
            }
            Some("failed") => {
                log::error!("Server refused DDP session: {}", text);
                shared.set_state(ConnectionState::Error).await;
            }
            Some("result") => {
                let mut login_id = shared.login_id.lock().await;
                if login_id.is_some() && *login_id == frame.id {
                    *login_id = None;
                    match frame.error {
                        Some(error) => {
                            log::error!("Realtime login failed: {}", error);
                            shared.set_state(ConnectionState::Error).await;
                        }
                        None => shared.set_state(ConnectionState::Connected).await,
                    }
                }
            }
            Some("ready") => {
                let subscriptions = shared.subscriptions.lock().await;
                for id in &frame.subs {
                    if let Some(callback) = subscriptions.get(id) {
                        callback(true, id);
                    }
                }
            }
            Some("nosub") => {
                if let Some(id) = frame.id {
                    if let Some(error) = &frame.error {
                        log::warn!("Subscription {} rejected: {}", id, error);
                    }
                    if let Some(callback) = shared.subscriptions.lock().await.remove(&id) {
                        callback(false, &id);
                    }
                }
            }
            Some("changed") => {
                let (Some(collection), Some(fields)) = (frame.collection, frame.fields) else {
                    return Ok(None);
                };
                if ![frames::STREAM_NOTIFY_USER, frames::STREAM_NOTIFY_ROOM, frames::STREAM_ROOM_MESSAGES]
                    .contains(&collection.as_str())
                {
                    log::debug!("Ignoring change on collection: {}", collection);
                    return Ok(None);
                }
                let fields: ChangedFields = match serde_json::from_value(fields) {
                    Ok(fields) => fields,
                    Err(e) => {
                        log::debug!("Unreadable {} notification: {}", collection, e);
                        return Ok(None);
                    }
                };
                if let Some(event) = convert_changed(&collection, fields) {
                    match shared.event_tx.try_send(event) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(event)) => {
                            log::warn!("Event queue is full, dropping event: {:?}", event);
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {}
                    }
                }
            }
            Some("added") | Some("updated") | Some("removed") | Some("pong") => {}
            Some(other) => log::debug!("Unhandled DDP message: {}", other),
            // The `{"server_id": ..}` greeting
            None => {}
        }

        Ok(None)
    }

    async fn send(&self, frame: String) -> Result<()> {
        let mut writer = self.ws_writer.lock().await;
        match writer.as_mut() {
            Some(ws) => ws
                .send(WsMessage::Text(frame))
                .await
                .map_err(|e| Error::new(ErrorCode::NetworkError, format!("Failed to send frame: {e}"))),
            None => Err(Error::new(ErrorCode::InvalidState, "Realtime socket not connected")),
        }
    }

    async fn subscribe(&self, id: String, frame: String, callback: SubscriptionCallback) -> Result<String> {
        self.shared.subscriptions.lock().await.insert(id.clone(), callback);
        if let Err(e) = self.send(frame).await {
            self.shared.subscriptions.lock().await.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Subscribe to changes of the user's rooms
    ///
    /// # Returns
    /// The subscription id, to pass to [`Socket::unsubscribe`]
    pub async fn subscribe_rooms<F>(&self, callback: F) -> Result<String>
    where
        F: Fn(bool, &str) + Send + Sync + 'static,
    {
        let token = self.client.require_token()?;
        let id = self.generate_id();
        let frame = frames::rooms_changed(&id, &token.user_id);
        self.subscribe(id, frame, Box::new(callback)).await
    }

    /// Subscribe to changes of the user's subscriptions (unread counts, open state, ...)
    pub async fn subscribe_subscriptions<F>(&self, callback: F) -> Result<String>
    where
        F: Fn(bool, &str) + Send + Sync + 'static,
    {
        let token = self.client.require_token()?;
        let id = self.generate_id();
        let frame = frames::subscriptions_changed(&id, &token.user_id);
        self.subscribe(id, frame, Box::new(callback)).await
    }

    /// Subscribe to new and edited messages of a room
    pub async fn subscribe_room_messages<F>(&self, room_id: &str, callback: F) -> Result<String>
    where
        F: Fn(bool, &str) + Send + Sync + 'static,
    {
        let id = self.generate_id();
        let frame = frames::room_messages(&id, room_id);
        self.subscribe(id, frame, Box::new(callback)).await
    }

    /// Subscribe to typing notifications of a room; they arrive as
    /// [`StreamEvent::Typing`]
    pub async fn subscribe_typing<F>(&self, room_id: &str, callback: F) -> Result<String>
    where
        F: Fn(bool, &str) + Send + Sync + 'static,
    {
        let id = self.generate_id();
        let frame = frames::typing_events(&id, room_id);
        self.subscribe(id, frame, Box::new(callback)).await
    }

    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        self.shared.subscriptions.lock().await.remove(subscription_id);
        self.send(frames::unsub(subscription_id)).await
    }

    /// Tell the room whether `username` is typing
    pub async fn set_typing_status(&self, room_id: &str, username: &str, is_typing: bool) -> Result<()> {
        let id = self.generate_id();
        self.send(frames::typing(&id, room_id, username, is_typing)).await
    }

    /// Poll for the next event from the event queue
    ///
    /// # Returns
    /// An Option containing the next StreamEvent, or None if the queue is empty
    pub async fn poll_event(&self) -> Option<StreamEvent> {
        let mut rx = self.event_rx.lock().await;
        rx.try_recv().ok()
    }

    /// Close the socket; the read task marks the state `Disconnected` when done
    pub async fn disconnect(&mut self) {
        self.shared.set_state(ConnectionState::Disconnecting).await;
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        // Dropping the sender stops the read task
        self.shutdown_tx.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::types::Token;
    use std::sync::atomic::AtomicUsize;

    fn client() -> RocketChatClient {
        RocketChatClient::new(ClientConfig::new("https://chat.example.com").with_event_queue_size(2)).unwrap()
    }

    fn changed_message(id: &str) -> String {
        serde_json::json!({
            "msg": "changed",
            "collection": "stream-room-messages",
            "id": "id",
            "fields": {
                "eventName": "GENERAL",
                "args": [{"_id": id, "rid": "GENERAL", "msg": "hi", "ts": {"$date": 1}}]
            }
        })
        .to_string()
    }

    #[test]
    fn test_socket_url() {
        let socket = Socket::new(client()).unwrap();
        assert_eq!(socket.url(), "wss://chat.example.com/websocket");
    }

    #[test]
    fn test_generate_id_is_unique() {
        let socket = Socket::new(client()).unwrap();
        let a = socket.generate_id();
        let b = socket.generate_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_initial_state() {
        let socket = Socket::new(client()).unwrap();
        assert_eq!(socket.state().await, ConnectionState::Disconnected);
        assert!(socket.poll_event().await.is_none());
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let (shared, _rx) = Shared::new(4);
        let reply = Socket::handle_frame(&shared, r#"{"msg":"ping","id":"9"}"#).await.unwrap();
        assert_eq!(reply, Some(frames::pong(Some("9"))));
        assert_eq!(Socket::handle_frame(&shared, r#"{"server_id":"0"}"#).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resume_login_flow() {
        let (shared, _rx) = Shared::new(4);
        *shared.login_id.lock().await = Some("1".to_string());

        Socket::handle_frame(&shared, r#"{"msg":"connected","session":"abc"}"#).await.unwrap();
        assert_eq!(*shared.state.lock().await, ConnectionState::Authenticating);

        Socket::handle_frame(&shared, r#"{"msg":"result","id":"1","result":{"id":"userId"}}"#).await.unwrap();
        assert_eq!(*shared.state.lock().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_resume_login_failure() {
        let (shared, _rx) = Shared::new(4);
        *shared.login_id.lock().await = Some("1".to_string());
        Socket::handle_frame(&shared, r#"{"msg":"result","id":"1","error":{"error":403,"reason":"You've been logged out by the server."}}"#)
            .await
            .unwrap();
        assert_eq!(*shared.state.lock().await, ConnectionState::Error);
    }

    #[tokio::test]
    async fn test_subscription_callbacks() {
        let (shared, _rx) = Shared::new(4);
        let ready = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));

        let (r, n) = (Arc::clone(&ready), Arc::clone(&rejected));
        let callback: SubscriptionCallback = Box::new(move |ok, id| {
            assert_eq!(id, "2");
            if ok {
                r.fetch_add(1, Ordering::SeqCst);
            } else {
                n.fetch_add(1, Ordering::SeqCst);
            }
        });
        shared.subscriptions.lock().await.insert("2".to_string(), callback);

        Socket::handle_frame(&shared, r#"{"msg":"ready","subs":["2"]}"#).await.unwrap();
        assert_eq!(ready.load(Ordering::SeqCst), 1);

        Socket::handle_frame(&shared, r#"{"msg":"nosub","id":"2","error":{"error":"not-allowed"}}"#)
            .await
            .unwrap();
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
        assert!(shared.subscriptions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_changed_frames_are_queued() {
        let (shared, mut rx) = Shared::new(4);
        Socket::handle_frame(&shared, &changed_message("a")).await.unwrap();
        match rx.try_recv() {
            Ok(StreamEvent::RoomMessage(message)) => assert_eq!(message.id, "a"),
            other => panic!("Expected RoomMessage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_events() {
        let (shared, mut rx) = Shared::new(2);
        for id in ["a", "b", "c"] {
            Socket::handle_frame(&shared, &changed_message(id)).await.unwrap();
        }
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_notification_is_queued() {
        let (shared, mut rx) = Shared::new(4);
        let frame = r#"{"msg":"changed","collection":"stream-notify-room","id":"id","fields":{"eventName":"GENERAL/typing","args":["testuser",true]}}"#;
        assert_eq!(Socket::handle_frame(&shared, frame).await.unwrap(), None);
        match rx.try_recv() {
            Ok(StreamEvent::Typing { room_id, username, typing }) => {
                assert_eq!(room_id, "GENERAL");
                assert_eq!(username, "testuser");
                assert!(typing);
            }
            other => panic!("Expected Typing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_document_frames_without_event_name() {
        let (shared, mut rx) = Shared::new(4);
        let added = r#"{"msg":"added","collection":"users","id":"userId","fields":{"username":"bob"}}"#;
        assert_eq!(Socket::handle_frame(&shared, added).await.unwrap(), None);

        let changed = r#"{"msg":"changed","collection":"users","id":"userId","fields":{"status":"away"}}"#;
        assert_eq!(Socket::handle_frame(&shared, changed).await.unwrap(), None);

        let unreadable = r#"{"msg":"changed","collection":"stream-room-messages","id":"id","fields":{"args":[]}}"#;
        assert_eq!(Socket::handle_frame(&shared, unreadable).await.unwrap(), None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_frame() {
        let (shared, _rx) = Shared::new(2);
        let err = Socket::handle_frame(&shared, "not json").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[tokio::test]
    async fn test_subscribe_rooms_requires_token() {
        let socket = Socket::new(client()).unwrap();
        let err = socket.subscribe_rooms(|_, _| {}).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let client = client();
        client.save_token(Token::new("userId", "authToken"));
        let socket = Socket::new(client).unwrap();

        let err = socket.subscribe_rooms(|_, _| {}).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(socket.shared.subscriptions.lock().await.is_empty());

        let err = socket.set_typing_status("GENERAL", "testuser", true).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err = socket.subscribe_typing("GENERAL", |_, _| {}).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(socket.shared.subscriptions.lock().await.is_empty());
    }
}
