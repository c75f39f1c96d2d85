//! Shared application state

use crate::config::RelayConfig;
use crate::types::{NotificationDefaults, NotificationEvent};

use super::broadcaster::Broadcaster;
use super::events::ServerEvent;

/// State shared by the webhook and WebSocket handlers
pub struct AppState {
    /// Connected clients
    pub broadcaster: Broadcaster,

    /// Settings loaded at startup
    pub config: RelayConfig,

    /// Placeholders for missing webhook fields
    pub defaults: NotificationDefaults,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        let defaults = NotificationDefaults {
            from: config.default_from.clone(),
            subject: config.default_subject.clone(),
        };

        Self {
            broadcaster: Broadcaster::new(),
            config,
            defaults,
        }
    }

    /// Fan a mail notification out to every connected client
    pub fn notify_new_mail(&self, notification: NotificationEvent) -> usize {
        self.broadcaster
            .broadcast_all(ServerEvent::NewMailNotification(notification))
    }

    /// Number of connected clients
    pub fn connected_clients(&self) -> usize {
        self.broadcaster.connection_count()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
