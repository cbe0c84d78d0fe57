//! Persistence ports.
//!
//! The engine treats storage as an opaque collaborator behind these traits:
//! the latest accepted configuration, the configured event catalog, and the
//! append-only purchase log. Identity counters are owned by the stores and
//! reset by `clear`, so a reset system starts numbering from 1 again.
//!
//! All methods are synchronous; the pool appends transactions while holding
//! its lock, so implementations must be cheap and must never block on I/O in
//! that path (batch and flush elsewhere if a durable backend is ever used).

use shared_types::{Event, EventSpec, NewTransaction, SystemConfig, Transaction};

/// Holds the most recently accepted configuration.
pub trait ConfigStore: Send + Sync {
    /// Atomically replaces the stored configuration.
    fn put(&self, config: SystemConfig);

    /// The most recently stored configuration, if any.
    fn current(&self) -> Option<SystemConfig>;

    /// Removes the stored configuration.
    fn clear(&self);
}

/// Holds the configured event catalog.
pub trait EventStore: Send + Sync {
    /// Replaces the whole catalog, assigning fresh identities from a counter
    /// that restarts at 1.
    fn replace_all(&self, specs: &[EventSpec]) -> Vec<Event>;

    /// All events in configuration order.
    fn list(&self) -> Vec<Event>;

    /// Empties the catalog and resets the identity counter.
    fn clear(&self);
}

/// Append-only log of completed purchases.
pub trait TransactionStore: Send + Sync {
    /// Appends a batch of purchase records, assigning identities and
    /// timestamps. Returns how many records were appended.
    fn append_all(&self, records: Vec<NewTransaction>) -> usize;

    /// All transactions in chronological (append) order.
    fn list(&self) -> Vec<Transaction>;

    /// Number of logged transactions.
    fn count(&self) -> usize;

    /// Sum of all logged transaction prices.
    fn total_value(&self) -> f64;

    /// Empties the log and resets the identity counter.
    fn clear(&self);
}
