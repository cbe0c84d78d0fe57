//! # Feed Subscriber
//!
//! The receiving side of the feed bus.

use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

use crate::events::{FeedFilter, FeedMessage};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The feed bus was dropped.
    #[error("feed bus closed")]
    Closed,
}

/// A subscription handle for receiving feed messages.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<FeedMessage>,

    /// Filter for this subscription.
    filter: FeedFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<FeedMessage>, filter: FeedFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receives the next message that matches the filter.
    ///
    /// Returns `None` when the bus has been dropped. A lagged receiver skips
    /// ahead silently; delivery is best effort by contract.
    pub async fn recv(&mut self) -> Option<FeedMessage> {
        loop {
            let message = match self.receiver.recv().await {
                Ok(m) => m,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Feed subscriber lagged, messages dropped");
                    continue;
                }
            };

            if self.filter.matches(&message) {
                return Some(message);
            }
        }
    }

    /// Receives without blocking.
    ///
    /// `Ok(None)` means no matching message is currently buffered.
    pub fn try_recv(&mut self) -> Result<Option<FeedMessage>, SubscriptionError> {
        loop {
            let message = match self.receiver.try_recv() {
                Ok(m) => m,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&message) {
                return Ok(Some(message));
            }
        }
    }

    /// The filter this subscription was created with.
    #[must_use]
    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }
}

/// A stream wrapper over a subscription, for combinator-style consumers.
pub struct FeedStream {
    subscription: Subscription,
}

impl FeedStream {
    /// Wraps `subscription` as a stream.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// The filter of the underlying subscription.
    #[must_use]
    pub fn filter(&self) -> &FeedFilter {
        self.subscription.filter()
    }
}

impl Stream for FeedStream {
    type Item = FeedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(message)) => Poll::Ready(Some(message)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::events::{FeedKind, FeedTopic};
    use crate::publisher::{FeedSink, InMemoryFeedBus};

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryFeedBus::new();
        let mut sub = bus.subscribe(FeedFilter::all());

        bus.publish(FeedMessage::system_start());

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(received.kind, FeedKind::SystemStart);
    }

    #[tokio::test]
    async fn test_subscription_filters_by_topic() {
        let bus = InMemoryFeedBus::new();
        let mut sub = bus.subscribe(FeedFilter::topics(vec![FeedTopic::TicketUpdates]));

        // Lifecycle message is filtered out, purchase comes through.
        bus.publish(FeedMessage::system_start());
        bus.publish(FeedMessage::ticket_purchase(1, 1, &["A".to_string()], 5.0, 0));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(received.kind, FeedKind::TicketPurchase);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = InMemoryFeedBus::new();
        let mut sub = bus.subscribe(FeedFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_bus_drop() {
        let bus = InMemoryFeedBus::new();
        let mut sub = bus.subscribe(FeedFilter::all());
        drop(bus);

        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_ahead() {
        let bus = InMemoryFeedBus::with_capacity(2);
        let mut sub = bus.subscribe(FeedFilter::all());

        for _ in 0..10 {
            bus.publish(FeedMessage::system_start());
        }

        // Messages were dropped, but the subscriber still receives the most
        // recent ones rather than an error.
        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(received.kind, FeedKind::SystemStart);
    }

    #[test]
    fn test_feed_stream_exposes_filter() {
        let bus = InMemoryFeedBus::new();
        let stream = bus.feed_stream(FeedFilter::topics(vec![FeedTopic::SystemUpdates]));
        assert_eq!(stream.filter().topics, vec![FeedTopic::SystemUpdates]);
    }
}
