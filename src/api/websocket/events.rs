//! WebSocket message types for real-time mail notifications

use serde::{Deserialize, Serialize};

use crate::types::NotificationEvent;

/// Events pushed from the relay to connected clients
///
/// Serialized as `{"event": "<name>", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new email arrived through the webhook
    NewMailNotification(NotificationEvent),
}

impl ServerEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewMailNotification(_) => crate::types::NEW_MAIL_EVENT,
        }
    }
}

/// WebSocket message wrapper with metadata
#[derive(Clone, Debug, Serialize)]
pub struct WsMessage {
    /// The relayed event
    #[serde(flatten)]
    pub event: ServerEvent,

    /// Monotonically increasing sequence ID for gap detection
    pub sequence_id: u64,

    /// Unix timestamp when the event was broadcast
    pub timestamp: i64,
}

/// Client message types
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for heartbeat
    Ping,
}

/// Welcome message sent on connection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub connection_id: String,
    pub current_sequence_id: u64,
}

impl WelcomeMessage {
    pub fn new(connection_id: &str, current_sequence_id: u64) -> Self {
        Self {
            msg_type: "connected".to_string(),
            connection_id: connection_id.to_string(),
            current_sequence_id,
        }
    }
}

/// Pong response message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl Default for PongMessage {
    fn default() -> Self {
        Self {
            msg_type: "pong".to_string(),
        }
    }
}
