//! `teamboard-watch` -- follow a service's notification stream from a terminal.
//!
//! Subscribes to the stream endpoint, logs every event it receives, and keeps
//! reconnecting with backoff until interrupted with Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default | Description                          |
//! |-------------------------------|----------|---------|--------------------------------------|
//! | `STREAM_URL`                  | yes      | --      | e.g. `http://host:8083/api/v1/notifications/stream` |
//! | `STREAM_TOKEN`                | yes      | --      | Bearer access token                  |
//! | `STREAM_BACKOFF_BASE_MS`      | no       | `500`   | First reconnect delay                |
//! | `STREAM_BACKOFF_MAX_MS`       | no       | `8000`  | Reconnect delay cap                  |
//! | `STREAM_STOP_ON_UNAUTHORIZED` | no       | `false` | Give up when the token is rejected   |

use std::time::Duration;

use teamboard_stream_client::{
    BackoffConfig, EventData, HandlerError, StreamClient, StreamClientConfig, StreamError,
    StreamEvent, StreamHandler,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
const DEFAULT_BACKOFF_MAX_MS: u64 = 8000;

/// Logs every event and failure.
struct LogHandler;

impl StreamHandler for LogHandler {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), HandlerError> {
        match &event.data {
            EventData::Json(value) => {
                tracing::info!(event_type = %event.event_type, payload = %value, "Event");
            }
            EventData::Text(text) => {
                tracing::info!(event_type = %event.event_type, payload = %text, "Event (text)");
            }
        }
        Ok(())
    }

    fn on_error(&mut self, error: &StreamError) {
        tracing::warn!(error = %error, "Stream error");
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamboard_watch=info,teamboard_stream_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = required_env("STREAM_URL");
    let token = required_env("STREAM_TOKEN");

    let base_ms = env_or("STREAM_BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS);
    let max_ms = env_or("STREAM_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS);
    let stop_on_unauthorized = env_or("STREAM_STOP_ON_UNAUTHORIZED", false);

    let config = StreamClientConfig {
        backoff: BackoffConfig {
            initial_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            ..Default::default()
        },
        stop_on_unauthorized,
        ..StreamClientConfig::new(url, token)
    };

    tracing::info!(url = %config.url, base_ms, max_ms, "Starting teamboard-watch");

    let subscription = StreamClient::new(config).subscribe(LogHandler);
    let mut state = subscription.state_changes();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Interrupted, stopping");
        }
        _ = state.wait_for(|s| *s == teamboard_stream_client::ConnectionState::Stopped) => {
            tracing::info!("Subscription stopped");
        }
    }

    subscription.stop_and_wait().await;
}

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
