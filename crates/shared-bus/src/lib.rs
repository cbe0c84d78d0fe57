//! # Shared Bus - Live Event Feed for the Ticket Marketplace
//!
//! Fans structured feed messages out from the core to any number of
//! observers (WebSocket connections, test recorders).
//!
//! ## Topics
//!
//! ```text
//! ┌──────────────┐                       ┌──────────────┐
//! │  TicketPool  │                       │  Subscriber  │
//! │  Controller  │      publish()        │ (WebSocket,  │
//! │   Workers    │ ──────┐               │  recorder)   │
//! └──────────────┘       │               └──────────────┘
//!                        ▼                       ↑
//!                  ┌──────────────┐              │
//!                  │   Feed Bus   │ ─────────────┘
//!                  └──────────────┘   subscribe(filter)
//! ```
//!
//! - `system-updates`: lifecycle transitions, status lines, worker errors
//! - `ticket-updates`: per-operation deposits, purchases, resets
//!
//! ## Delivery Contract
//!
//! Best effort. Publishing never blocks and never fails the caller: with no
//! subscribers the message is dropped; a lagging subscriber skips ahead and
//! loses the overwritten messages. There is no replay.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{FeedFilter, FeedKind, FeedMessage, FeedTopic};
pub use publisher::{FeedSink, InMemoryFeedBus, NoOpFeedSink};
pub use subscriber::{FeedStream, Subscription, SubscriptionError};

/// Maximum messages buffered per subscriber before older ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
