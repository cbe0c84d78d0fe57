//! Outer-layer store implementations.

pub mod memory;

pub use memory::{InMemoryConfigStore, InMemoryEventStore, InMemoryTransactionStore};
