use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::Token;

/// Storage for authentication tokens, keyed by server URL.
///
/// Implement this to persist tokens across process restarts; the default
/// [`MemoryTokenRepository`] forgets them on drop.
pub trait TokenRepository: Send + Sync {
    /// Store `token` for the server at `url`
    fn save(&self, url: &str, token: Token);
    /// Token for the server at `url`, if logged in
    fn get(&self, url: &str) -> Option<Token>;
    /// Forget the token for the server at `url`
    fn clear(&self, url: &str);
}

/// In-memory token storage
#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    tokens: RwLock<HashMap<String, Token>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenRepository for MemoryTokenRepository {
    fn save(&self, url: &str, token: Token) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(url.to_string(), token);
        }
    }

    fn get(&self, url: &str) -> Option<Token> {
        self.tokens.read().ok()?.get(url).cloned()
    }

    fn clear(&self, url: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(url);
        }
    }
}
