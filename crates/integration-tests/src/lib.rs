//! Test support for end-to-end marketplace schedules.
//!
//! Builds a fully wired engine (and optionally the HTTP router on top of it)
//! with a compressed cadence budget so whole runs complete in test time.

use std::sync::Arc;
use std::time::Duration;

use api_gateway::{AppState, CorsConfig};
use shared_bus::InMemoryFeedBus;
use shared_types::LifecycleState;
use ticket_engine::{
    InMemoryConfigStore, InMemoryEventStore, InMemoryTransactionStore, LifecycleController,
    TicketPool, WorkerTunables,
};

/// A fully wired marketplace with handles to every observable seam.
pub struct Marketplace {
    /// The lifecycle controller.
    pub controller: Arc<LifecycleController>,
    /// The feed bus.
    pub bus: Arc<InMemoryFeedBus>,
    /// The configuration store.
    pub config_store: Arc<InMemoryConfigStore>,
    /// The event catalog.
    pub event_store: Arc<InMemoryEventStore>,
    /// The purchase log.
    pub transaction_store: Arc<InMemoryTransactionStore>,
}

impl Marketplace {
    /// Wires a marketplace with a compressed cadence (200 ms budget, four
    /// customers) so a ten-ticket run finishes in about a second.
    pub fn compressed() -> Self {
        Self::with_tunables(WorkerTunables {
            cadence_budget_ms: 200,
            customer_count: 4,
        })
    }

    /// Wires a marketplace with explicit tunables.
    pub fn with_tunables(tunables: WorkerTunables) -> Self {
        let bus = Arc::new(InMemoryFeedBus::new());
        let config_store = Arc::new(InMemoryConfigStore::new());
        let event_store = Arc::new(InMemoryEventStore::new());
        let transaction_store = Arc::new(InMemoryTransactionStore::new());
        let pool = Arc::new(TicketPool::new(bus.clone(), transaction_store.clone()));
        let controller = Arc::new(LifecycleController::with_tunables(
            pool,
            bus.clone(),
            config_store.clone(),
            event_store.clone(),
            transaction_store.clone(),
            tunables,
        ));

        Self {
            controller,
            bus,
            config_store,
            event_store,
            transaction_store,
        }
    }

    /// The HTTP router over this marketplace.
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            controller: Arc::clone(&self.controller),
            config_store: self.config_store.clone(),
            event_store: self.event_store.clone(),
            bus: Arc::clone(&self.bus),
        };
        api_gateway::router(state, &CorsConfig::default())
    }

    /// Polls until the controller reaches `expected` or ten seconds pass.
    pub async fn wait_for_state(&self, expected: LifecycleState) -> LifecycleState {
        for _ in 0..400 {
            if self.controller.state() == expected {
                return expected;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        self.controller.state()
    }
}
