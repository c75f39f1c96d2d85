//! HTTP server setup with Axum

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::webhook::webhook_email;
use super::websocket::{handler::ws_handler, state::AppState};
use crate::config::{AllowedOrigins, RelayConfig};
use crate::error::{RelayError, RelayResult};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // Inbound webhook from the mail automation
        .route("/webhook-email", post(webhook_email))
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::from(Any),
        AllowedOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "ignoring invalid origin");
                        None
                    }
                }),
        ),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connected_clients": state.connected_clients(),
        "version": crate::VERSION,
    }))
}

/// Serve the relay on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> RelayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured address and run until Ctrl+C or SIGTERM
pub async fn run_server(config: RelayConfig) -> RelayResult<()> {
    let addr = config.bind_addr();

    if config.allowed_origins.is_any() {
        warn!("RELAY_ALLOWED_ORIGINS is '*': accepting WebSocket and CORS requests from any origin");
    }
    if config.webhook_token.is_none() {
        warn!("RELAY_WEBHOOK_TOKEN is not set: the webhook accepts unauthenticated requests");
    }

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Relay listening on http://{}", addr);
    info!("Waiting for WebSocket clients on /ws and webhooks on /webhook-email");

    let state = Arc::new(AppState::new(config));
    serve(listener, state, shutdown_signal()).await?;

    info!("Relay stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received");
}
