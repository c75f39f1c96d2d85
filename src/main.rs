//! Mail Relay Server - Binary Entry Point
//!
//! This is the main entry point for the mail-relay binary.

use mail_relay::{run_server, RelayConfig, RelayResult};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> RelayResult<()> {
    init_tracing();

    let config = RelayConfig::from_env().inspect_err(|e| error!("{}", e))?;

    run_server(config).await.inspect_err(|e| error!("{}", e))
}
