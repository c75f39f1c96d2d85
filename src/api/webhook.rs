//! Inbound email webhook
//!
//! `POST /webhook-email` accepts `from` and `subject` from a JSON body, a
//! form-encoded body or the query string, fills in placeholders for
//! whatever is missing and broadcasts the result. Input is never rejected
//! for its shape; only a configured webhook token can turn a request away.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::websocket::state::AppState;
use crate::error::{RelayError, RelayResult};
use crate::types::{NotificationEvent, WebhookFields};

/// Header carrying the shared webhook secret
pub const TOKEN_HEADER: &str = "x-webhook-token";

/// Acknowledgment message returned for every accepted webhook
pub const ACK_MESSAGE: &str = "Notificación enviada exitosamente";

/// Webhook response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl Default for WebhookAck {
    fn default() -> Self {
        Self {
            status: ACK_MESSAGE.to_string(),
        }
    }
}

/// Handle an inbound email notification
///
/// A query string that fails to decode is treated as empty.
pub async fn webhook_email(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WebhookFields>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> RelayResult<Json<WebhookAck>> {
    let query_fields = match query {
        Ok(Query(fields)) => fields,
        Err(e) => {
            debug!(error = %e, "ignoring undecodable query string");
            WebhookFields::default()
        }
    };

    if let Some(expected) = state.config.webhook_token.as_deref() {
        let presented = headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .or(query_fields.token.as_deref());

        if !presented.is_some_and(|token| token_matches(token, expected)) {
            warn!("webhook rejected: missing or invalid token");
            return Err(RelayError::Unauthorized);
        }
    }

    let body_fields = body_fields(&headers, &body);
    let notification = NotificationEvent::resolve(&body_fields, &query_fields, &state.defaults);

    info!(
        from = %notification.from,
        subject = %notification.subject,
        "webhook received"
    );

    let recipients = state.notify_new_mail(notification);
    info!(recipients, "notification broadcast");

    Ok(Json(WebhookAck::default()))
}

/// Extract fields from the request body
///
/// Form-encoded bodies are decoded as such; anything else is tried as JSON.
/// Bodies that fail to parse contribute nothing.
fn body_fields(headers: &HeaderMap, body: &[u8]) -> WebhookFields {
    if body.is_empty() {
        return WebhookFields::default();
    }

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let mut fields = if is_form {
        serde_urlencoded::from_bytes::<WebhookFields>(body).unwrap_or_default()
    } else {
        serde_json::from_slice::<serde_json::Value>(body)
            .map(|value| WebhookFields::from_json(&value))
            .unwrap_or_default()
    };

    // The secret is only accepted from the header or the query string
    fields.token = None;
    fields
}

fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
