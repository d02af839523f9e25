//! tickfeed Binary
//!
//! Connects to the feed with credentials from the environment, subscribes
//! the configured tokens, and logs every delivery until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tickfeed
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `FEED_API_KEY`: Feed API key
//! - `FEED_ACCESS_TOKEN`: Feed session access token
//!
//! ## Optional
//! - `FEED_WS_URL`: Feed endpoint (default: wss://ws.kite.trade)
//! - `FEED_TOKENS`: Comma-separated instrument tokens to subscribe
//! - `FEED_MODE`: Streaming mode - "ltp" | "quote" | "full" (default: quote)
//! - `FEED_LIVENESS_TIMEOUT_SECS`: Staleness window (default: 10)
//! - `FEED_RECONNECT_DELAY_INITIAL_MS`: First backoff delay (default: 2000)
//! - `FEED_RECONNECT_DELAY_MAX_SECS`: Backoff cap (default: 60)
//! - `FEED_MAX_RECONNECT_ATTEMPTS`: Retry budget (default: 50)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use tickfeed::infrastructure::telemetry;
use tickfeed::{
    ControlMessage, FeedClient, FeedConfig, FeedError, FeedHandler, InstrumentToken, Mode,
    TickRecord,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting tickfeed");

    let config = FeedConfig::from_env()?;
    let tokens = tokens_from_env();
    let mode = mode_from_env();
    log_config(&config, &tokens, mode);

    let client = FeedClient::new(config, Arc::new(LogHandler));
    if !tokens.is_empty() {
        client.subscribe(&tokens);
        client.set_mode(mode, &tokens);
    }
    client.connect()?;

    await_shutdown().await;

    client.close();
    tracing::info!("tickfeed stopped");
    Ok(())
}

/// Handler that logs every delivery through `tracing`.
struct LogHandler;

impl FeedHandler for LogHandler {
    fn on_connect(&self, status: u16) {
        tracing::info!(status, "Feed connected");
    }

    fn on_ticks(&self, ticks: Vec<TickRecord>) {
        tracing::info!(count = ticks.len(), "Tick batch");
        for tick in ticks {
            tracing::debug!(
                token = tick.token,
                mode = %tick.mode,
                last_price = %tick.last_price,
                "Tick"
            );
        }
    }

    fn on_message(&self, message: ControlMessage) {
        tracing::info!(kind = %message.kind, "Control message");
    }

    fn on_close(&self, code: u16, reason: &str) {
        tracing::warn!(code, reason, "Feed connection closed");
    }

    fn on_error(&self, error: &FeedError) {
        tracing::error!(error = %error, "Feed error");
    }

    fn on_reconnect(&self, attempt: u32) {
        tracing::info!(attempt, "Reconnecting");
    }

    fn on_noreconnect(&self) {
        tracing::error!("Reconnect attempts exhausted");
    }
}

/// Parse the token list from `FEED_TOKENS`.
fn tokens_from_env() -> Vec<InstrumentToken> {
    std::env::var("FEED_TOKENS")
        .map(|raw| {
            raw.split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the streaming mode from `FEED_MODE`.
fn mode_from_env() -> Mode {
    std::env::var("FEED_MODE")
        .map(|raw| Mode::from_str_case_insensitive(&raw))
        .unwrap_or_default()
}

/// Log the parsed configuration.
fn log_config(config: &FeedConfig, tokens: &[InstrumentToken], mode: Mode) {
    tracing::info!(
        url = %config.root_url,
        tokens = tokens.len(),
        mode = %mode,
        liveness_timeout_secs = config.websocket.liveness_timeout.as_secs(),
        max_reconnect_attempts = config.websocket.max_reconnect_attempts,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
