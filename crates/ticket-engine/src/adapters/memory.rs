//! In-memory store adapters.
//!
//! Process-lifetime implementations of the persistence ports. Suitable for
//! single-node operation and tests; a durable deployment would put a
//! database behind the same traits.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;

use shared_types::{Event, EventSpec, NewTransaction, SystemConfig, Transaction};

use crate::ports::{ConfigStore, EventStore, TransactionStore};

/// In-memory [`ConfigStore`].
#[derive(Default)]
pub struct InMemoryConfigStore {
    current: Mutex<Option<SystemConfig>>,
}

impl InMemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn put(&self, config: SystemConfig) {
        *self.current.lock() = Some(config);
    }

    fn current(&self) -> Option<SystemConfig> {
        self.current.lock().clone()
    }

    fn clear(&self) {
        *self.current.lock() = None;
    }
}

/// In-memory [`EventStore`] with a resettable identity counter.
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
    next_id: AtomicU64,
}

impl InMemoryEventStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn replace_all(&self, specs: &[EventSpec]) -> Vec<Event> {
        let mut events = self.events.lock();
        self.next_id.store(1, Ordering::SeqCst);
        *events = specs
            .iter()
            .map(|spec| Event {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                name: spec.name.clone(),
                price: spec.price,
            })
            .collect();
        events.clone()
    }

    fn list(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn clear(&self) {
        self.events.lock().clear();
        self.next_id.store(1, Ordering::SeqCst);
    }
}

/// In-memory [`TransactionStore`] with a resettable identity counter.
pub struct InMemoryTransactionStore {
    transactions: Mutex<Vec<Transaction>>,
    next_id: AtomicU64,
}

impl InMemoryTransactionStore {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn append_all(&self, records: Vec<NewTransaction>) -> usize {
        if records.is_empty() {
            return 0;
        }
        let now = Utc::now();
        let mut transactions = self.transactions.lock();
        let appended = records.len();
        transactions.extend(records.into_iter().map(|record| Transaction {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            event_name: record.event_name,
            price: record.price,
            vendor_id: record.vendor_id,
            customer_id: record.customer_id,
            ticket_count: record.ticket_count,
            timestamp: now,
        }));
        appended
    }

    fn list(&self) -> Vec<Transaction> {
        self.transactions.lock().clone()
    }

    fn count(&self) -> usize {
        self.transactions.lock().len()
    }

    fn total_value(&self) -> f64 {
        self.transactions.lock().iter().map(|t| t.price).sum()
    }

    fn clear(&self) {
        self.transactions.lock().clear();
        self.next_id.store(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, price: f64) -> EventSpec {
        EventSpec {
            name: name.to_string(),
            price,
        }
    }

    fn record(event: &str, price: f64) -> NewTransaction {
        NewTransaction {
            event_name: event.to_string(),
            price,
            vendor_id: 1,
            customer_id: 2,
            ticket_count: 1,
        }
    }

    #[test]
    fn test_config_store_replace_and_clear() {
        let store = InMemoryConfigStore::new();
        assert!(store.current().is_none());

        let config = SystemConfig {
            max_capacity: 10,
            total_tickets: 10,
            release_rate: 2,
            retrieval_rate: 2,
            events: vec![spec("A", 5.0)],
        };
        store.put(config.clone());
        assert_eq!(store.current(), Some(config));

        store.clear();
        assert!(store.current().is_none());
    }

    #[test]
    fn test_event_store_assigns_fresh_ids_from_one() {
        let store = InMemoryEventStore::new();

        let events = store.replace_all(&[spec("A", 5.0), spec("B", 7.5)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 1);
        assert_eq!(events[1].id, 2);

        // A replacement restarts the identity counter.
        let events = store.replace_all(&[spec("C", 1.0)]);
        assert_eq!(events[0].id, 1);
        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "C");
        assert_eq!(listed[0].price, 1.0);
    }

    #[test]
    fn test_transaction_store_appends_in_order() {
        let store = InMemoryTransactionStore::new();

        store.append_all(vec![record("A", 5.0), record("A", 5.0)]);
        store.append_all(vec![record("B", 7.5)]);

        let all = store.list();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[2].id, 3);
        assert_eq!(all[2].event_name, "B");
        assert_eq!(store.count(), 3);
        assert!((store.total_value() - 17.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transaction_clear_resets_identity() {
        let store = InMemoryTransactionStore::new();
        store.append_all(vec![record("A", 5.0)]);
        store.clear();
        assert_eq!(store.count(), 0);

        store.append_all(vec![record("B", 7.5)]);
        assert_eq!(store.list()[0].id, 1);
    }

    #[test]
    fn test_append_empty_batch_is_noop() {
        let store = InMemoryTransactionStore::new();
        assert_eq!(store.append_all(Vec::new()), 0);
        assert_eq!(store.count(), 0);
    }
}
