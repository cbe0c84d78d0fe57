//! # Ticket Marketplace Runtime
//!
//! The main entry point for the ticket marketplace simulator.
//!
//! ## Wiring
//!
//! All components are constructed explicitly here and injected; their
//! lifetime is the lifetime of the process.
//!
//! ```text
//! stores ──→ TicketPool ──→ LifecycleController ──→ Router
//!    │            │                                   │
//!    └────────────┴────── InMemoryFeedBus ←───────────┘
//!                          (WebSocket feed)
//! ```
//!
//! The REST surface and the WebSocket feed are served from one listener.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use api_gateway::{AppState, GatewayConfig};
use shared_bus::InMemoryFeedBus;
use ticket_engine::{
    InMemoryConfigStore, InMemoryEventStore, InMemoryTransactionStore, LifecycleController,
    TicketPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Ticket Marketplace Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let gateway_config = GatewayConfig::default();
    gateway_config.validate()?;

    // Construct and wire the components.
    let bus = Arc::new(InMemoryFeedBus::new());
    let config_store = Arc::new(InMemoryConfigStore::new());
    let event_store = Arc::new(InMemoryEventStore::new());
    let transaction_store = Arc::new(InMemoryTransactionStore::new());
    let pool = Arc::new(TicketPool::new(bus.clone(), transaction_store.clone()));
    let controller = Arc::new(LifecycleController::new(
        pool,
        bus.clone(),
        config_store.clone(),
        event_store.clone(),
        transaction_store,
    ));

    let state = AppState {
        controller: Arc::clone(&controller),
        config_store,
        event_store,
        bus,
    };
    let app = api_gateway::router(state, &gateway_config.cors);

    let addr = gateway_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");
    info!("Service is running. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop any active run so worker tasks drain before the process exits.
    let _ = controller.stop().await;
    info!("Shutdown complete.");

    Ok(())
}

/// Resolves when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Received shutdown signal");
}
