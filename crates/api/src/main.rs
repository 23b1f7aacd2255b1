use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewline_api::config::ServerConfig;
use crewline_api::router::build_app_router;
use crewline_api::state::AppState;
use crewline_api::background;
use crewline_events::{MemoryBackend, PgBackend};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "crewline_api=debug,crewline_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage backend ---
    let state = match config.database_url.clone() {
        Some(database_url) => {
            let pool = crewline_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            crewline_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            crewline_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let backend = Arc::new(PgBackend::new(pool.clone()));
            AppState::with_backend(Some(pool), config.clone(), backend)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory backend (data is not persisted)");
            AppState::with_backend(None, config.clone(), Arc::new(MemoryBackend::new()))
        }
    };

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();
    if config.background_jobs {
        handles.push(tokio::spawn(background::scheduler::run(
            Arc::clone(&state.scheduler),
            Duration::from_secs(config.scheduler_interval_secs),
            cancel.clone(),
        )));
        handles.push(tokio::spawn(background::dispatch::run(
            Arc::clone(&state.worker),
            Duration::from_secs(config.dispatch_poll_secs),
            config.dispatch_batch_size,
            cancel.clone(),
        )));
        tracing::info!("Background services started (scheduler, dispatch)");
    } else {
        tracing::info!("Background jobs disabled; use POST /api/v1/jobs/{{job}} to run them");
    }

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    for handle in handles {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!(timeout_secs = grace.as_secs(), "Background task did not stop in time");
        }
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
