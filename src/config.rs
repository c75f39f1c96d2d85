//! Relay configuration loaded from environment variables
//!
//! Environment:
//! - PORT: TCP port to listen on (optional, default 4000)
//! - RELAY_HOST: Bind address (optional, default 0.0.0.0)
//! - RELAY_ALLOWED_ORIGINS: Comma-separated origins, or `*` for any (optional, default `*`)
//! - RELAY_WEBHOOK_TOKEN: Shared secret required on the webhook (optional)
//! - RELAY_DEFAULT_FROM: Placeholder sender (optional, default "Desconocido")
//! - RELAY_DEFAULT_SUBJECT: Placeholder subject (optional, default "Sin asunto")

use crate::error::{RelayError, RelayResult};
use crate::types::{DEFAULT_FROM, DEFAULT_SUBJECT};

/// Fallback port when PORT is unset
pub const DEFAULT_PORT: u16 = 4000;

/// Fallback bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Origins accepted for CORS requests and WebSocket upgrades
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Accept every origin
    #[default]
    Any,
    /// Accept only these exact origins
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse `*` or a comma-separated list. Blank input means any.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }

    /// Check a request `Origin` header value
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(list) => {
                let origin = origin.trim_end_matches('/');
                list.iter().any(|o| o == origin)
            }
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, AllowedOrigins::Any)
    }
}

/// Runtime settings for the relay server
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub webhook_token: Option<String>,
    pub default_from: String,
    pub default_subject: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: AllowedOrigins::Any,
            webhook_token: None,
            default_from: DEFAULT_FROM.to_string(),
            default_subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

impl RelayConfig {
    /// Create from process environment variables
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup (used by `from_env` and tests)
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(port) = non_empty("PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|e| RelayError::config("PORT", format!("{:?}: {}", port, e)))?;
        }

        if let Some(host) = non_empty("RELAY_HOST") {
            config.host = host;
        }

        if let Some(origins) = non_empty("RELAY_ALLOWED_ORIGINS") {
            config.allowed_origins = AllowedOrigins::parse(&origins);
        }

        config.webhook_token = non_empty("RELAY_WEBHOOK_TOKEN");

        if let Some(from) = non_empty("RELAY_DEFAULT_FROM") {
            config.default_from = from;
        }

        if let Some(subject) = non_empty("RELAY_DEFAULT_SUBJECT") {
            config.default_subject = subject;
        }

        Ok(config)
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
