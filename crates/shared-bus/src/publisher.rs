//! # Feed Publisher
//!
//! The publishing side of the feed bus.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{FeedFilter, FeedMessage};
use crate::subscriber::{FeedStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// The sink the core publishes into.
///
/// Deliberately synchronous: the pool emits while holding its lock, so
/// publishing must never await and never fail the caller.
pub trait FeedSink: Send + Sync {
    /// Publishes a message, returning how many subscribers received it.
    fn publish(&self, message: FeedMessage) -> usize;

    /// Total messages published (including those nobody received).
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the feed bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for single-process operation; a distributed deployment
/// would swap in a different [`FeedSink`].
pub struct InMemoryFeedBus {
    /// Broadcast sender for feed messages.
    sender: broadcast::Sender<FeedMessage>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryFeedBus {
    /// Creates a bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with a specific per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribes to messages matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: FeedFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New feed subscription");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Convenience wrapper returning a [`FeedStream`].
    #[must_use]
    pub fn feed_stream(&self, filter: FeedFilter) -> FeedStream {
        FeedStream::new(self.subscribe(filter))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryFeedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSink for InMemoryFeedBus {
    fn publish(&self, message: FeedMessage) -> usize {
        let kind = message.kind;

        // The attempt counts even when nobody is listening.
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(?kind, receivers = receiver_count, "Feed message published");
                receiver_count
            }
            Err(_) => {
                debug!(?kind, "Feed message dropped (no subscribers)");
                0
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

/// A sink that drops everything. Lets the engine run without a live feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpFeedSink;

impl FeedSink for NoOpFeedSink {
    fn publish(&self, _message: FeedMessage) -> usize {
        0
    }

    fn messages_published(&self) -> u64 {
        0
    }
}
