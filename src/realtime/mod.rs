//! Realtime API over the server's DDP WebSocket endpoint

mod events;
pub mod frames;
mod socket;

pub use events::{ChangeKind, StreamEvent};
pub use socket::{Socket, SubscriptionCallback};
