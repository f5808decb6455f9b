//! newsrank-server - REST API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use newsrank_core::{EventBus, EventSubscriber, NewsrankConfig, SearchEvent};
use newsrank_server::{build_engine, create_server, AppState};
use tokio::signal;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Log search events until the bus is dropped.
async fn log_events(mut events: EventSubscriber) {
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::Completed(e) => debug!(
                search_id = %e.search_id,
                method = %e.method,
                count = e.count,
                cached = e.cached,
                duration_ms = e.duration_ms,
                "search.completed"
            ),
            SearchEvent::Degraded(e) => warn!(
                search_id = %e.search_id,
                failed = %e.failed,
                fallback = %e.fallback,
                error = %e.error,
                "search.degraded"
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("newsrank_server=debug".parse()?),
        )
        .init();

    let host = std::env::var("NEWSRANK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("NEWSRANK_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .context("NEWSRANK_PORT must be a valid port number")?;

    let config = NewsrankConfig::load().context("failed to load configuration")?;
    let events = EventBus::new();
    tokio::spawn(log_events(events.subscribe()));

    let engine = build_engine(&config)
        .context("failed to build search engine")?
        .with_event_bus(events);
    let state = AppState::new(engine);
    let app = create_server(state.clone());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting newsrank-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, cancelling in-flight searches");
            shutdown.cancel();
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
