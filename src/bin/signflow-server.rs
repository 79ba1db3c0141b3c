//! # Signflow Server
//!
//! Serves the signature flow HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! # PostgreSQL-backed, configuration from ./config/signflow.yaml
//! SIGNFLOW_ENV=production cargo run --bin signflow-server
//!
//! # Throwaway in-memory store
//! cargo run --bin signflow-server -- --in-memory
//! ```

use anyhow::Context;
use std::env;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use signflow_core::config::ConfigManager;
use signflow_core::database::{DatabaseConnection, DatabaseMigrations};
use signflow_core::events::FlowEventPublisher;
use signflow_core::flow::SignatureFlowEngine;
use signflow_core::logging;
use signflow_core::repository::{InMemorySignatureFlowStore, PgSignatureFlowStore};
use signflow_core::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let in_memory = env::args().skip(1).any(|arg| arg == "--in-memory");

    let config_manager = ConfigManager::load().context("Failed to load configuration")?;
    let config = config_manager.config();

    logging::init_structured_logging(config_manager.environment(), &config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config_manager.environment(),
        config_file = %config_manager.config_file().display(),
        in_memory,
        "Starting signflow server"
    );

    let events = FlowEventPublisher::new(config.events.channel_capacity);

    let app_state = if in_memory {
        warn!("Using the in-memory store; nothing survives a restart");
        let engine = SignatureFlowEngine::with_event_publisher(InMemorySignatureFlowStore::new(), events);
        AppState::new(engine, config.web.clone(), config_manager.environment())
    } else {
        let database = DatabaseConnection::connect(&config.database)
            .await
            .context("Failed to connect to the database")?;

        if config.database.run_migrations {
            DatabaseMigrations::run_all(database.pool())
                .await
                .context("Failed to run database migrations")?;
        }

        let store = PgSignatureFlowStore::new(database.pool().clone()).with_timeouts(
            config.database.statement_timeout(),
            config.database.lock_timeout(),
        );
        let engine = SignatureFlowEngine::with_event_publisher(store, events);
        AppState::new(engine, config.web.clone(), config_manager.environment())
            .with_database(database)
    };

    let database = app_state.database.clone();
    let app = web::create_app(app_state);

    let listener = TcpListener::bind(&config.web.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.web.bind_address))?;

    info!(bind_address = %config.web.bind_address, "Signflow server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    if let Some(database) = database {
        database.close().await;
    }

    info!("Signflow server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
