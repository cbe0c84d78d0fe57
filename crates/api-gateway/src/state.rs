//! Shared handler state.

use std::sync::Arc;

use shared_bus::InMemoryFeedBus;
use ticket_engine::{ConfigStore, EventStore, LifecycleController};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle controller driving the engine.
    pub controller: Arc<LifecycleController>,
    /// Read access to the accepted configuration.
    pub config_store: Arc<dyn ConfigStore>,
    /// Read access to the event catalog.
    pub event_store: Arc<dyn EventStore>,
    /// The feed bus, subscribed to by WebSocket connections.
    pub bus: Arc<InMemoryFeedBus>,
}
