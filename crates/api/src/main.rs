use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teamboard_api::config::ServerConfig;
use teamboard_api::gate::membership::TeamServiceClient;
use teamboard_api::gate::AuthorizationGate;
use teamboard_api::router::build_app_router;
use teamboard_api::state::AppState;
use teamboard_api::store::{InMemoryRegistrationStore, InMemoryTaskStore};
use teamboard_api::stream;
use teamboard_events::EventHub;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamboard_api=debug,teamboard_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        service = %config.service_name,
        "Loaded server configuration",
    );

    // --- Event hubs ---
    let hub = Arc::new(EventHub::new());
    let role_hub = Arc::new(EventHub::new());

    // --- Heartbeat ---
    let heartbeat_interval = Duration::from_secs(config.heartbeat_interval_secs);
    let heartbeats = [
        stream::start_heartbeat(Arc::clone(&hub), heartbeat_interval),
        stream::start_heartbeat(Arc::clone(&role_hub), heartbeat_interval),
    ];

    // --- Authorization gate ---
    let membership = TeamServiceClient::new(
        config.team_service_url.clone(),
        Duration::from_secs(config.team_service_timeout_secs),
    );
    tracing::info!(team_service = %membership.base_url(), "Membership source configured");
    let gate = Arc::new(AuthorizationGate::new(Arc::new(membership)));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        hub: Arc::clone(&hub),
        role_hub: Arc::clone(&role_hub),
        gate,
        tasks: Arc::new(InMemoryTaskStore::new()),
        registrations: Arc::new(InMemoryRegistrationStore::new()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = Arc::clone(&shutdown);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    tokio::select! {
        () = shutdown_signal() => {}
        result = &mut server => {
            log_server_exit(result);
            heartbeats.iter().for_each(|h| h.abort());
            return;
        }
    }

    // Stop accepting, then end every open stream so in-flight responses can
    // complete; streams never finish on their own.
    shutdown.notify_one();
    let closed = hub.shutdown_all().await + role_hub.shutdown_all().await;
    tracing::info!(closed, "Closed notification streams");

    match tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), server).await {
        Ok(result) => log_server_exit(result),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Shutdown timeout elapsed with requests still in flight",
        ),
    }

    // --- Post-shutdown cleanup ---
    heartbeats.iter().for_each(|h| h.abort());
    tracing::info!("Heartbeat tasks stopped");

    tracing::info!("Graceful shutdown complete");
}

fn log_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::info!("Server stopped accepting connections"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server error"),
        Err(e) => tracing::error!(error = %e, "Server task failed"),
    }
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
