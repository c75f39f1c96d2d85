//! Mail Relay Server
//!
//! Receives new-email notifications from a mail automation webhook and
//! relays them in real time to every CRM client connected over WebSocket.
//!
//! # Features
//!
//! - **Webhook ingestion**: `POST /webhook-email` with JSON, form or query fields
//! - **Fan-out**: each notification goes to all connected clients as `new_mail_notification`
//! - **Fire-and-forget**: no persistence, no replay, at-most-once delivery
//! - **Configurable origins**: explicit allow-list for CORS and WebSocket upgrades
//! - **Optional webhook token**: shared secret checked on every webhook call
//!
//! # Modules
//!
//! - `types`: Notification payload and webhook field resolution
//! - `api`: Axum router, webhook handler and WebSocket channel
//! - `config`: Environment-driven settings
//! - `error`: Relay error type
//!
//! # Example
//!
//! ```no_run
//! use mail_relay::{run_server, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RelayConfig::from_env().unwrap();
//!     run_server(config).await.unwrap();
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use api::http::{create_router, run_server, serve};
pub use api::websocket::{AppState, Broadcaster, ServerEvent, WsMessage};
pub use config::{AllowedOrigins, RelayConfig};
pub use error::{RelayError, RelayResult};
pub use types::{NotificationEvent, NEW_MAIL_EVENT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
