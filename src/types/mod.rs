//! Core types for librocketchat
//!
//! Typed models for the JSON the server sends, including the attachment codec.

pub mod attachment;
pub mod connection;
pub mod message;
pub mod room;
pub mod timestamp;
pub mod user;

// Re-export for convenience
pub use attachment::{
    Attachment, AudioAttachment, AuthorAttachment, Field, ImageAttachment, MessageAttachment,
    VideoAttachment,
};
pub use connection::ConnectionState;
pub use message::{Message, SimpleRoom, Url};
pub use room::{ChatRoom, RestMultiResult, Room, RoomType, Subscription};
pub use user::{Email, Myself, SimpleUser, Token, User, UserStatus};
