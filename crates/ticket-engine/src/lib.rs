//! # Ticket Engine - Concurrent Marketplace Core
//!
//! The producer/consumer coordination engine: a bounded ticket pool fed by
//! vendor workers and drained by customer workers, governed by a lifecycle
//! state machine and observed through the shared feed bus.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | `current = added - sold = pool length` | `domain/pool.rs` - single monitor lock |
//! | `added <= total_tickets` | `domain/pool.rs` - `deposit()` clamp |
//! | `sold <= added` | `domain/pool.rs` - `withdraw()` pops only held tickets |
//! | exhausted ⇔ `sold = total ∧ pool empty` | `domain/pool.rs` - checked after every purchase |
//! | one transaction per consumed ticket | `domain/pool.rs` - batched append under the lock |
//! | exactly one lifecycle state | `lifecycle.rs` - derived from pool flags |
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory config/event/transaction stores          │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports.rs     - ConfigStore, EventStore, TransactionStore      │
//! │  lifecycle.rs - LifecycleController (start/stop/reset)         │
//! │  workers.rs   - cadenced vendor/customer tasks                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/pool.rs   - TicketPool monitor (lock + semaphore)      │
//! │  domain/errors.rs - EngineError                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod lifecycle;
pub mod ports;
pub mod workers;

pub use adapters::{InMemoryConfigStore, InMemoryEventStore, InMemoryTransactionStore};
pub use domain::{DepositReceipt, EngineError, TicketPool, WithdrawOutcome};
pub use lifecycle::LifecycleController;
pub use ports::{ConfigStore, EventStore, TransactionStore};
pub use workers::WorkerTunables;
