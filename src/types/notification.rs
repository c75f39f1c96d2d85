//! New-mail notification payload

use serde::{Deserialize, Serialize};

/// Placeholder sender used when the webhook omits `from`
pub const DEFAULT_FROM: &str = "Desconocido";

/// Placeholder subject used when the webhook omits `subject`
pub const DEFAULT_SUBJECT: &str = "Sin asunto";

/// Event name clients listen for
pub const NEW_MAIL_EVENT: &str = "new_mail_notification";

/// Notification about a newly received email
///
/// Built when the webhook fires, handed to every connected client and
/// then dropped. Nothing about it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub from: String,
    pub subject: String,
}

impl NotificationEvent {
    pub fn new(from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
        }
    }

    /// Build an event from raw webhook fields
    ///
    /// Each field takes the body value first, then the query value, then
    /// the placeholder. Empty strings count as missing; anything else,
    /// whitespace included, is kept as given.
    pub fn resolve(body: &WebhookFields, query: &WebhookFields, defaults: &NotificationDefaults) -> Self {
        Self {
            from: pick(&body.from, &query.from, &defaults.from),
            subject: pick(&body.subject, &query.subject, &defaults.subject),
        }
    }
}

fn pick(primary: &Option<String>, fallback: &Option<String>, default: &str) -> String {
    [primary, fallback]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Optional `from`/`subject` as found in one part of a webhook request
///
/// Deserialized from the query string or a form-encoded body; unknown keys
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookFields {
    pub from: Option<String>,
    pub subject: Option<String>,
    /// Shared webhook secret, only honored on the query string
    pub token: Option<String>,
}

impl WebhookFields {
    /// Collect fields from a JSON body. Non-objects yield nothing.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            from: obj.get("from").and_then(scalar_text),
            subject: obj.get("subject").and_then(scalar_text),
            token: None,
        }
    }
}

/// Text form of a truthy JSON scalar
///
/// `null`, `false`, zero, arrays and objects count as missing.
fn scalar_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Placeholder values substituted for missing fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub from: String,
    pub subject: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}
