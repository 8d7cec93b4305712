//! REST API client
//!
//! Thin typed wrappers over the server's `/api/v1/` methods. Requests carry
//! the `X-User-Id`/`X-Auth-Token` pair from the [`TokenRepository`].

mod auth;
mod client;
mod messages;
mod rooms;
mod token;
mod types;
mod users;

pub use client::RocketChatClient;
pub use token::{MemoryTokenRepository, TokenRepository};
pub use types::*;
