//! # Lifecycle Controller
//!
//! Owns the start/stop/reset state machine and the worker population of a
//! run. The state itself lives in the pool flags; the controller guards the
//! transitions and manages worker tasks and stores.
//!
//! ```text
//! [Idle] ──start──→ [Running] ──stop──→ [Stopped] ──start──→ [Running]
//!                       │                    │
//!                 (supply sold out)        reset
//!                       ↓                    ↓
//!                  [Exhausted] ──reset──→ [Idle]
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared_bus::{FeedMessage, FeedSink};
use shared_types::{Event, LifecycleState, PoolSnapshot, SystemConfig};

use crate::domain::{EngineError, TicketPool};
use crate::ports::{ConfigStore, EventStore, TransactionStore};
use crate::workers::{spawn_customer, spawn_vendor, WorkerTunables};

/// Handles of the active (or most recent) run.
#[derive(Default)]
struct RunHandles {
    workers: Vec<JoinHandle<()>>,
}

/// Drives the lifecycle of the marketplace.
pub struct LifecycleController {
    pool: Arc<TicketPool>,
    bus: Arc<dyn FeedSink>,
    config_store: Arc<dyn ConfigStore>,
    event_store: Arc<dyn EventStore>,
    transaction_store: Arc<dyn TransactionStore>,
    tunables: WorkerTunables,
    run: Mutex<RunHandles>,
}

impl LifecycleController {
    /// Creates a controller with the default worker tunables.
    pub fn new(
        pool: Arc<TicketPool>,
        bus: Arc<dyn FeedSink>,
        config_store: Arc<dyn ConfigStore>,
        event_store: Arc<dyn EventStore>,
        transaction_store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self::with_tunables(
            pool,
            bus,
            config_store,
            event_store,
            transaction_store,
            WorkerTunables::default(),
        )
    }

    /// Creates a controller with explicit worker tunables (tests compress
    /// the cadence budget through this).
    pub fn with_tunables(
        pool: Arc<TicketPool>,
        bus: Arc<dyn FeedSink>,
        config_store: Arc<dyn ConfigStore>,
        event_store: Arc<dyn EventStore>,
        transaction_store: Arc<dyn TransactionStore>,
        tunables: WorkerTunables,
    ) -> Self {
        Self {
            pool,
            bus,
            config_store,
            event_store,
            transaction_store,
            tunables,
            run: Mutex::new(RunHandles::default()),
        }
    }

    /// Accepts a validated configuration.
    ///
    /// Replaces the event catalog (identity counter restarts at 1) and the
    /// stored configuration. Rejected while a run is active; the active
    /// run's configuration is immutable.
    pub fn configure(&self, config: SystemConfig) -> Result<Vec<Event>, EngineError> {
        if self.pool.is_running() {
            return Err(EngineError::ReconfigureWhileRunning);
        }

        let events = self.event_store.replace_all(&config.events);
        self.config_store.put(config);
        Ok(events)
    }

    /// Starts a run.
    ///
    /// Requires an accepted configuration with at least one event; must not
    /// already be running; an exhausted system must be reset first. Clears
    /// the transaction log, arms the pool, spawns one vendor per event and
    /// the customer population, and announces the start.
    pub fn start(&self) -> Result<(), EngineError> {
        match self.pool.state() {
            LifecycleState::Running => return Err(EngineError::AlreadyRunning),
            LifecycleState::Exhausted => return Err(EngineError::MustReset),
            LifecycleState::Idle | LifecycleState::Stopped => {}
        }

        let config = self
            .config_store
            .current()
            .ok_or(EngineError::NoConfiguration)?;
        let events = self.event_store.list();
        if events.is_empty() {
            return Err(EngineError::NoEvents);
        }

        self.transaction_store.clear();

        let token = CancellationToken::new();
        self.pool
            .arm(&config, token.clone(), self.tunables.customer_count);

        // Announced before the first worker runs, so the feed shows the
        // start ahead of any deposit.
        self.bus.publish(FeedMessage::system_start());

        let release_rate = config.effective_release_rate();
        let retrieval_rate = config.effective_retrieval_rate();
        let vendor_cadence = self.tunables.cadence(release_rate);
        let customer_cadence = self.tunables.cadence(retrieval_rate);

        let mut workers = Vec::new();
        for (i, event) in events.into_iter().enumerate() {
            workers.push(spawn_vendor(
                Arc::clone(&self.pool),
                Arc::clone(&self.bus),
                token.child_token(),
                (i + 1) as u32,
                event,
                release_rate,
                vendor_cadence,
            ));
        }
        for customer_id in 1..=self.tunables.customer_count {
            workers.push(spawn_customer(
                Arc::clone(&self.pool),
                Arc::clone(&self.bus),
                token.child_token(),
                customer_id,
                retrieval_rate,
                customer_cadence,
            ));
        }
        self.run.lock().workers = workers;

        Ok(())
    }

    /// Stops the active run and waits for the workers to drain.
    ///
    /// Returns the run totals `(tickets_added, tickets_sold)`. A second
    /// consecutive call reports [`EngineError::NotRunning`] without changing
    /// state.
    pub async fn stop(&self) -> Result<(u64, u64), EngineError> {
        let totals = self.pool.halt()?;
        self.join_workers().await;
        Ok(totals)
    }

    /// Resets the system to its initial state.
    ///
    /// Stops first when running, then clears the pool, the transaction log,
    /// the event catalog, and the stored configuration. A reset system must
    /// be re-configured before the next start.
    pub async fn reset(&self) {
        // An idle or already-stopped system has nothing to halt.
        let _ = self.pool.halt();
        self.join_workers().await;

        self.pool.clear();
        self.transaction_store.clear();
        self.event_store.clear();
        self.config_store.clear();

        self.bus.publish(FeedMessage::system_reset());
    }

    /// Waits for every worker of the most recent run to finish.
    async fn join_workers(&self) {
        let workers = std::mem::take(&mut self.run.lock().workers);
        for worker in workers {
            let _ = worker.await;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.pool.state()
    }

    /// Consistent pool snapshot.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared_bus::InMemoryFeedBus;
    use shared_types::EventSpec;

    use super::*;
    use crate::adapters::{InMemoryConfigStore, InMemoryEventStore, InMemoryTransactionStore};

    struct Harness {
        controller: LifecycleController,
        transactions: Arc<InMemoryTransactionStore>,
        events: Arc<InMemoryEventStore>,
        configs: Arc<InMemoryConfigStore>,
    }

    fn harness() -> Harness {
        let bus = Arc::new(InMemoryFeedBus::new());
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let events = Arc::new(InMemoryEventStore::new());
        let configs = Arc::new(InMemoryConfigStore::new());
        let pool = Arc::new(TicketPool::new(bus.clone(), transactions.clone()));
        let controller = LifecycleController::with_tunables(
            pool,
            bus,
            configs.clone(),
            events.clone(),
            transactions.clone(),
            WorkerTunables {
                cadence_budget_ms: 200,
                customer_count: 4,
            },
        );
        Harness {
            controller,
            transactions,
            events,
            configs,
        }
    }

    fn config(max_capacity: u32, total_tickets: u32, events: &[(&str, f64)]) -> SystemConfig {
        SystemConfig {
            max_capacity,
            total_tickets,
            release_rate: 2,
            retrieval_rate: 2,
            events: events
                .iter()
                .map(|(name, price)| EventSpec {
                    name: name.to_string(),
                    price: *price,
                })
                .collect(),
        }
    }

    async fn wait_for_state(
        controller: &LifecycleController,
        expected: LifecycleState,
    ) -> LifecycleState {
        for _ in 0..400 {
            if controller.state() == expected {
                return expected;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        controller.state()
    }

    #[tokio::test]
    async fn test_start_requires_configuration() {
        let h = harness();
        assert_eq!(h.controller.start(), Err(EngineError::NoConfiguration));
    }

    #[tokio::test]
    async fn test_start_requires_events() {
        let h = harness();
        // A configuration can exist while the catalog is empty (cleared by
        // a partial reset of the stores); start must still refuse.
        h.configs.put(config(10, 10, &[("A", 5.0)]));
        assert_eq!(h.controller.start(), Err(EngineError::NoEvents));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let h = harness();
        h.controller.configure(config(100, 100, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();

        assert_eq!(h.controller.start(), Err(EngineError::AlreadyRunning));
        h.controller.reset().await;
    }

    #[tokio::test]
    async fn test_configure_rejected_while_running() {
        let h = harness();
        h.controller.configure(config(100, 100, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();

        assert_eq!(
            h.controller.configure(config(10, 10, &[("B", 1.0)])),
            Err(EngineError::ReconfigureWhileRunning)
        );
        h.controller.reset().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_with_indicator() {
        let h = harness();
        h.controller.configure(config(100, 100, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();

        let (added, sold) = h.controller.stop().await.unwrap();
        assert!(sold <= added);
        assert_eq!(h.controller.state(), LifecycleState::Stopped);

        assert_eq!(h.controller.stop().await, Err(EngineError::NotRunning));
        assert_eq!(h.controller.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_run_to_exhaustion() {
        let h = harness();
        h.controller.configure(config(10, 10, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();

        let state = wait_for_state(&h.controller, LifecycleState::Exhausted).await;
        assert_eq!(state, LifecycleState::Exhausted);

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.tickets_added, 10);
        assert_eq!(snapshot.tickets_sold, 10);
        assert_eq!(snapshot.current_tickets, 0);

        assert_eq!(h.transactions.count(), 10);
        assert!(h
            .transactions
            .list()
            .iter()
            .all(|t| t.event_name == "A" && (t.price - 5.0).abs() < f64::EPSILON));

        // A sold-out system refuses to start until reset.
        assert_eq!(h.controller.start(), Err(EngineError::MustReset));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle_and_clears_stores() {
        let h = harness();
        h.controller.configure(config(10, 10, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();
        wait_for_state(&h.controller, LifecycleState::Exhausted).await;

        h.controller.reset().await;

        assert_eq!(h.controller.state(), LifecycleState::Idle);
        assert_eq!(h.controller.snapshot(), PoolSnapshot::default());
        assert_eq!(h.transactions.count(), 0);
        assert!(h.events.list().is_empty());
        assert!(h.configs.current().is_none());

        // Reset cleared the configuration; a restart needs a re-configure.
        assert_eq!(h.controller.start(), Err(EngineError::NoConfiguration));
    }

    #[tokio::test]
    async fn test_start_clears_previous_transaction_log() {
        let h = harness();
        h.controller.configure(config(100, 100, &[("A", 5.0)])).unwrap();
        h.controller.start().unwrap();

        // Let at least one purchase land, then stop.
        for _ in 0..200 {
            if h.transactions.count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        h.controller.stop().await.unwrap();

        h.controller.start().unwrap();
        // The new run begins with an empty log.
        let count_at_start = h.transactions.count();
        h.controller.stop().await.unwrap();
        assert!(count_at_start <= h.transactions.count());
        h.controller.reset().await;
    }
}
