//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::broadcaster::ClientQueue;
use super::events::{ClientMessage, PongMessage, WelcomeMessage};
use super::state::AppState;
use crate::error::RelayError;

/// WebSocket upgrade handler
///
/// Rejects the upgrade with 403 when an allow-list is configured and the
/// request's `Origin` is not on it. Requests without an `Origin` header
/// (non-browser clients) are accepted.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Some(origin) = headers.get(ORIGIN).and_then(|v| v.to_str().ok()) {
        if !state.config.allowed_origins.allows(origin) {
            warn!(origin, "rejected WebSocket upgrade from disallowed origin");
            return RelayError::OriginRejected(origin.to_string()).into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (connection_id, mut queue) = state.broadcaster.register();
    info!(
        connection_id = %connection_id,
        connected_clients = state.connected_clients(),
        "client connected"
    );

    let welcome = WelcomeMessage::new(&connection_id, state.broadcaster.current_sequence_id());
    let greeted = match serde_json::to_string(&welcome) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(_) => true,
    };

    if greeted {
        pump(&mut socket, &mut queue).await;
    }

    state.broadcaster.unregister(&connection_id);
    info!(
        connection_id = %connection_id,
        connected_clients = state.connected_clients(),
        "client disconnected"
    );
}

/// Forward queued events to the socket until either side goes away
async fn pump(socket: &mut WebSocket, queue: &mut ClientQueue) {
    loop {
        tokio::select! {
            // Broadcast events to client
            queued = queue.recv() => {
                let Some(msg) = queued else {
                    break; // Unregistered
                };
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if socket.send(Message::Text(json)).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to serialize event"),
                }
            }

            // Handle client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, socket).await {
                            break; // Client requested close
                        }
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket transport error");
                        break;
                    }
                    None => break, // Client disconnected
                }
            }
        }
    }
}

/// What to do with a frame received from the client
#[derive(Debug, PartialEq)]
enum ClientAction {
    Reply(Message),
    Ignore,
    Close,
}

fn client_action(msg: Message) -> ClientAction {
    match msg {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Ping) => match serde_json::to_string(&PongMessage::default()) {
                Ok(json) => ClientAction::Reply(Message::Text(json)),
                Err(_) => ClientAction::Ignore,
            },
            Err(_) => ClientAction::Ignore,
        },
        Message::Ping(data) => ClientAction::Reply(Message::Pong(data)),
        Message::Binary(_) | Message::Pong(_) => ClientAction::Ignore,
        Message::Close(_) => ClientAction::Close,
    }
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(msg: Message, socket: &mut WebSocket) -> bool {
    match client_action(msg) {
        ClientAction::Reply(reply) => match socket.send(reply).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "failed to answer heartbeat");
                false
            }
        },
        ClientAction::Ignore => true,
        ClientAction::Close => false,
    }
}
