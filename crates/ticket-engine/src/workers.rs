//! # Cadenced Workers
//!
//! Vendor and customer tasks share one shape: a cancellable loop that runs a
//! step, then sleeps for a rate-derived cadence. Cancellation is observed at
//! every suspension; no worker ever holds the pool lock across one.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared_bus::{FeedMessage, FeedSink};
use shared_types::Event;

use crate::domain::TicketPool;

/// Knobs of the worker population.
///
/// The defaults reproduce the canonical simulation: a 40-second cadence
/// budget divided by the configured rate, and twenty customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTunables {
    /// Budget in milliseconds divided by the rate to obtain a worker's
    /// sleep between steps.
    pub cadence_budget_ms: u64,
    /// Number of customer workers spawned per run.
    pub customer_count: u32,
}

impl Default for WorkerTunables {
    fn default() -> Self {
        Self {
            cadence_budget_ms: 40_000,
            customer_count: 20,
        }
    }
}

impl WorkerTunables {
    /// Sleep between steps for a worker driven at `rate`.
    ///
    /// Larger rates produce shorter sleeps; a zero rate is treated as 1 so
    /// the division stays defined.
    pub fn cadence(&self, rate: u32) -> Duration {
        Duration::from_millis(self.cadence_budget_ms / u64::from(rate.max(1)))
    }
}

/// Uniform batch size in `[1, rate]` inclusive.
///
/// Scoped so the thread-local generator is never held across an await.
fn batch_size(rate: u32) -> usize {
    rand::thread_rng().gen_range(1..=rate.max(1)) as usize
}

/// Spawns the vendor task for one configured event.
///
/// Deposits a random batch each step and exits once the supply is fully
/// released (or its batch was clamped, which implies the same). Cancellation
/// at a suspension emits the vendor interrupt on the feed.
pub fn spawn_vendor(
    pool: Arc<TicketPool>,
    bus: Arc<dyn FeedSink>,
    token: CancellationToken,
    vendor_id: u32,
    event: Event,
    release_rate: u32,
    cadence: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        bus.publish(FeedMessage::system_status(format!(
            "Starting vendor thread for vendor {vendor_id} with event {}",
            event.name
        )));

        loop {
            if token.is_cancelled() {
                bus.publish(FeedMessage::vendor_interrupt(vendor_id));
                return;
            }

            let requested = batch_size(release_rate);
            let receipt = pool.deposit(vendor_id, &event.name, event.price, requested);

            if receipt.supply_exhausted {
                bus.publish(FeedMessage::system_status(format!(
                    "Total tickets reached. Vendor {vendor_id} cannot add more tickets."
                )));
                return;
            }
            if receipt.deposited < requested {
                // Halted mid-run; exit without the sold-out status line.
                return;
            }

            tokio::select! {
                _ = token.cancelled() => {
                    bus.publish(FeedMessage::vendor_interrupt(vendor_id));
                    return;
                }
                _ = tokio::time::sleep(cadence) => {}
            }
        }
    })
}

/// Spawns one customer task.
///
/// Withdraws a random batch each step and exits when a withdrawal comes back
/// empty while the pool is no longer running. Cancellation during a
/// withdrawal emits the customer interrupt; cancellation during the cadence
/// sleep exits quietly.
pub fn spawn_customer(
    pool: Arc<TicketPool>,
    bus: Arc<dyn FeedSink>,
    token: CancellationToken,
    customer_id: u32,
    retrieval_rate: u32,
    cadence: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if token.is_cancelled() {
                bus.publish(FeedMessage::customer_interrupt(customer_id));
                return;
            }

            let requested = batch_size(retrieval_rate);
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    bus.publish(FeedMessage::customer_interrupt(customer_id));
                    return;
                }
                outcome = pool.withdraw(customer_id, requested) => outcome,
            };

            if outcome.purchased == 0 && !pool.is_running() {
                return;
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(cadence) => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use shared_bus::{FeedFilter, FeedKind, InMemoryFeedBus};
    use shared_types::{EventSpec, SystemConfig};
    use tokio::time::timeout;

    use super::*;
    use crate::adapters::InMemoryTransactionStore;

    fn config(total: u32) -> SystemConfig {
        SystemConfig {
            max_capacity: total,
            total_tickets: total,
            release_rate: 2,
            retrieval_rate: 2,
            events: vec![EventSpec {
                name: "A".to_string(),
                price: 5.0,
            }],
        }
    }

    fn event() -> Event {
        Event {
            id: 1,
            name: "A".to_string(),
            price: 5.0,
        }
    }

    fn pool_with_bus() -> (Arc<TicketPool>, Arc<InMemoryFeedBus>) {
        let bus = Arc::new(InMemoryFeedBus::new());
        let store = Arc::new(InMemoryTransactionStore::new());
        (Arc::new(TicketPool::new(bus.clone(), store)), bus)
    }

    #[test]
    fn test_default_tunables_match_canonical_simulation() {
        let tunables = WorkerTunables::default();
        assert_eq!(tunables.cadence_budget_ms, 40_000);
        assert_eq!(tunables.customer_count, 20);
        assert_eq!(tunables.cadence(2), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cadence_tolerates_zero_rate() {
        let tunables = WorkerTunables::default();
        assert_eq!(tunables.cadence(0), Duration::from_millis(40_000));
    }

    #[test]
    fn test_batch_size_stays_in_range() {
        for _ in 0..100 {
            let k = batch_size(3);
            assert!((1..=3).contains(&k));
        }
        assert_eq!(batch_size(0), 1);
        assert_eq!(batch_size(1), 1);
    }

    #[tokio::test]
    async fn test_vendor_releases_whole_supply_then_exits() {
        let (pool, bus) = pool_with_bus();
        let token = CancellationToken::new();
        pool.arm(&config(5), token.clone(), 0);

        let handle = spawn_vendor(
            pool.clone(),
            bus.clone(),
            token.child_token(),
            1,
            event(),
            2,
            Duration::from_millis(1),
        );

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("vendor should exit on its own")
            .unwrap();
        assert_eq!(pool.snapshot().tickets_added, 5);
    }

    #[tokio::test]
    async fn test_customer_exits_when_pool_halts() {
        let (pool, bus) = pool_with_bus();
        let token = CancellationToken::new();
        pool.arm(&config(10), token.clone(), 1);

        let handle = spawn_customer(
            pool.clone(),
            bus.clone(),
            token.child_token(),
            1,
            2,
            Duration::from_millis(1),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.halt().unwrap();

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("customer should drain after halt")
            .unwrap();
        assert_eq!(pool.snapshot().tickets_sold, 0);
    }

    #[tokio::test]
    async fn test_cancelled_customer_emits_interrupt() {
        let (pool, bus) = pool_with_bus();
        let run_token = CancellationToken::new();
        pool.arm(&config(10), run_token.clone(), 0);

        let mut feed = bus.subscribe(FeedFilter::all());
        let worker_token = run_token.child_token();
        let handle = spawn_customer(
            pool.clone(),
            bus.clone(),
            worker_token.clone(),
            3,
            2,
            Duration::from_millis(1),
        );

        // Blocked on the empty pool; cancel while suspended in withdraw.
        tokio::time::sleep(Duration::from_millis(20)).await;
        worker_token.cancel();

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("cancelled customer should exit")
            .unwrap();

        let mut saw_interrupt = false;
        while let Ok(Some(message)) = feed.try_recv() {
            if message.kind == FeedKind::CustomerPurchaseInterrupt {
                saw_interrupt = true;
            }
        }
        assert!(saw_interrupt);
    }

    #[tokio::test]
    async fn test_vendor_stops_quietly_when_pool_halted() {
        let (pool, bus) = pool_with_bus();
        let token = CancellationToken::new();
        pool.arm(&config(100), token.clone(), 0);
        pool.halt().unwrap();

        let handle = spawn_vendor(
            pool.clone(),
            bus.clone(),
            token.child_token(),
            1,
            event(),
            2,
            Duration::from_millis(1),
        );

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("vendor should exit against a halted pool")
            .unwrap();
        assert_eq!(pool.snapshot().tickets_added, 0);
    }
}
