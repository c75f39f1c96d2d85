//! WebSocket module for real-time mail notifications
//!
//! Provides the WebSocket endpoint at `/ws`. Every connected client receives
//! a `new_mail_notification` event each time the webhook fires.
//!
//! ## Features
//! - Explicit connection registry with per-client queues
//! - Sequence ID tracking for gap detection
//! - JSON `ping`/`pong` heartbeat
//! - No replay: clients only see events broadcast while connected

pub mod broadcaster;
pub mod events;
pub mod handler;
pub mod state;

// Re-export commonly used items
pub use broadcaster::{Broadcaster, ConnectionId};
pub use events::{ServerEvent, WsMessage};
pub use state::AppState;
