//! Momenta HTTP server.
//!
//! Loads configuration from the environment (and `.env`), opens the database, starts
//! the notification worker and serves the JSON API until Ctrl+C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://momenta@localhost/momenta PORT=8080 cargo run --bin server
//! ```
//!
//! Without `DATABASE_URL` the server keeps its state in memory and loses it on exit.

use momenta::{
    config::Config,
    metrics::install_prometheus,
    notification::{self, ConsoleNotifier, EmailTemplates, NotificationWorker},
    persistence::{InMemoryPersistence, Persistence, PostgresPersistence},
    server::{build_router, AppState},
    TicketingService,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus = install_prometheus()?;
    info!(
        consume_policy = %config.booking.consume_policy,
        max_tickets = config.booking.max_tickets_per_booking,
        "Configuration loaded"
    );

    // Notifications are delivered off the request path
    let (outbox, receiver) = notification::channel();
    let worker = NotificationWorker::new(
        receiver,
        ConsoleNotifier::new(),
        EmailTemplates::new(config.email.clone()),
    );
    let worker = tokio::spawn(worker.run());

    let persistence: Arc<dyn Persistence> = match &config.database.url {
        Some(url) => {
            let postgres = PostgresPersistence::connect(url, config.database.max_connections).await?;
            postgres.migrate().await?;
            info!(max_connections = config.database.max_connections, "Connected to PostgreSQL");
            Arc::new(postgres)
        },
        None => {
            warn!("DATABASE_URL is not set; state will be lost on shutdown");
            Arc::new(InMemoryPersistence::new())
        },
    };
    let service = TicketingService::open(&config, Arc::new(outbox), persistence).await?;
    let app = build_router(AppState::new(service).with_metrics(prometheus));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Momenta server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the outbox sender) is gone, so the worker drains and stops
    match worker.await {
        Ok(stats) => info!(?stats, "Notification worker finished"),
        Err(error) => warn!(%error, "Notification worker aborted"),
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
