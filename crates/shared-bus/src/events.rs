//! # Feed Messages
//!
//! The envelope every observer receives, the message kinds that flow through
//! the bus, and the topic routing between them.
//!
//! Constructors double as the logging seam: each one writes the same line to
//! the tracing backend that it packs into the envelope, so the server log and
//! the live feed always agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

/// The two logical feed topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedTopic {
    /// Lifecycle transitions, status lines, worker errors.
    SystemUpdates,
    /// Per-operation ticket movement: deposits, purchases, resets.
    TicketUpdates,
}

impl FeedTopic {
    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemUpdates => "system-updates",
            Self::TicketUpdates => "ticket-updates",
        }
    }

    /// Parses a wire topic name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system-updates" => Some(Self::SystemUpdates),
            "ticket-updates" => Some(Self::TicketUpdates),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every kind of message the marketplace emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedKind {
    /// A vendor deposited a batch of tickets.
    VendorTicketAdd,
    /// A customer completed a purchase.
    TicketPurchase,
    /// The system started a run.
    SystemStart,
    /// The system halted a run.
    SystemStop,
    /// The system was wiped back to its initial state.
    SystemReset,
    /// A free-form status line.
    SystemStatus,
    /// A vendor worker was cancelled mid-operation.
    VendorThreadInterrupt,
    /// A customer worker was cancelled mid-operation.
    CustomerPurchaseInterrupt,
}

impl FeedKind {
    /// Topics this kind is routed to.
    ///
    /// Resets appear on both: observers of ticket movement need to drop
    /// their state, and lifecycle observers need the transition.
    pub fn topics(&self) -> &'static [FeedTopic] {
        match self {
            Self::VendorTicketAdd | Self::TicketPurchase => &[FeedTopic::TicketUpdates],
            Self::SystemReset => &[FeedTopic::SystemUpdates, FeedTopic::TicketUpdates],
            Self::SystemStart
            | Self::SystemStop
            | Self::SystemStatus
            | Self::VendorThreadInterrupt
            | Self::CustomerPurchaseInterrupt => &[FeedTopic::SystemUpdates],
        }
    }
}

/// The envelope delivered to subscribers.
///
/// Serialized shape:
/// `{ "type": ..., "message": ..., "details": {...}, "timestamp": RFC3339 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: FeedKind,
    /// Human-readable summary.
    pub message: String,
    /// Kind-specific key/value details.
    pub details: Value,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl FeedMessage {
    fn new(kind: FeedKind, message: String, details: Value) -> Self {
        Self {
            kind,
            message,
            details,
            timestamp: Utc::now(),
        }
    }

    /// Topics this message is routed to.
    pub fn topics(&self) -> &'static [FeedTopic] {
        self.kind.topics()
    }

    /// A vendor deposited `tickets_added` tickets for `event_name`.
    pub fn vendor_ticket_add(
        vendor_id: u32,
        event_name: &str,
        tickets_added: usize,
        price: f64,
        current_tickets: u64,
    ) -> Self {
        let message = format!(
            "Vendor {vendor_id} added {tickets_added} tickets for event {event_name} at price ${price:.2}"
        );
        info!(vendor_id, event_name, tickets_added, current_tickets, "{message}");
        Self::new(
            FeedKind::VendorTicketAdd,
            message,
            json!({
                "vendorId": vendor_id,
                "eventName": event_name,
                "ticketsAdded": tickets_added,
                "price": price,
                "currentTickets": current_tickets,
            }),
        )
    }

    /// A customer purchased `tickets_bought` tickets.
    pub fn ticket_purchase(
        customer_id: u32,
        tickets_bought: usize,
        event_names: &[String],
        total_price: f64,
        current_tickets: u64,
    ) -> Self {
        let message = format!(
            "Customer {customer_id} purchased {tickets_bought} tickets for events {event_names:?} | Total Price: ${total_price:.2}"
        );
        info!(customer_id, tickets_bought, current_tickets, "{message}");
        Self::new(
            FeedKind::TicketPurchase,
            message,
            json!({
                "customerId": customer_id,
                "ticketsBought": tickets_bought,
                "events": event_names,
                "totalPrice": total_price,
                "currentTickets": current_tickets,
            }),
        )
    }

    /// The marketplace began a run.
    pub fn system_start() -> Self {
        let message = "Ticket handling system started".to_string();
        info!("{message}");
        Self::new(FeedKind::SystemStart, message, json!({}))
    }

    /// The marketplace halted, with run totals.
    pub fn system_stop(tickets_added: u64, tickets_sold: u64) -> Self {
        let message = format!(
            "Ticket system stopped. Total tickets added: {tickets_added}, Total tickets sold: {tickets_sold}"
        );
        info!(tickets_added, tickets_sold, "{message}");
        Self::new(
            FeedKind::SystemStop,
            message,
            json!({
                "ticketsAdded": tickets_added,
                "ticketsSold": tickets_sold,
            }),
        )
    }

    /// The marketplace was reset to its initial state.
    pub fn system_reset() -> Self {
        let message =
            "Ticket handling system has been reset and is ready to start again.".to_string();
        info!("{message}");
        Self::new(FeedKind::SystemReset, message, json!({}))
    }

    /// A free-form status line.
    pub fn system_status(status: impl Into<String>) -> Self {
        let message = status.into();
        info!("{message}");
        Self::new(FeedKind::SystemStatus, message, json!({}))
    }

    /// A vendor worker was cancelled while suspended.
    pub fn vendor_interrupt(vendor_id: u32) -> Self {
        let message = format!("Vendor thread for vendor {vendor_id} was interrupted");
        error!(vendor_id, "{message}");
        Self::new(
            FeedKind::VendorThreadInterrupt,
            message,
            json!({ "vendorId": vendor_id }),
        )
    }

    /// A customer worker was cancelled while suspended.
    pub fn customer_interrupt(customer_id: u32) -> Self {
        let message = format!("Ticket purchase was interrupted for customer {customer_id}");
        error!(customer_id, "{message}");
        Self::new(
            FeedKind::CustomerPurchaseInterrupt,
            message,
            json!({ "customerId": customer_id }),
        )
    }
}

/// Selects which messages a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    /// Topics to receive. Empty means every topic.
    pub topics: Vec<FeedTopic>,
}

impl FeedFilter {
    /// A filter that matches every message.
    pub fn all() -> Self {
        Self { topics: Vec::new() }
    }

    /// A filter restricted to the given topics.
    pub fn topics(topics: Vec<FeedTopic>) -> Self {
        Self { topics }
    }

    /// Whether `message` passes this filter.
    pub fn matches(&self, message: &FeedMessage) -> bool {
        self.topics.is_empty() || message.topics().iter().any(|t| self.topics.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_wire_names_round_trip() {
        for topic in [FeedTopic::SystemUpdates, FeedTopic::TicketUpdates] {
            assert_eq!(FeedTopic::parse(topic.as_str()), Some(topic));
        }
        assert_eq!(FeedTopic::parse("nonsense"), None);
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&FeedKind::VendorTicketAdd).unwrap();
        assert_eq!(json, "\"VENDOR_TICKET_ADD\"");
        let json = serde_json::to_string(&FeedKind::CustomerPurchaseInterrupt).unwrap();
        assert_eq!(json, "\"CUSTOMER_PURCHASE_INTERRUPT\"");
    }

    #[test]
    fn test_envelope_shape() {
        let message = FeedMessage::vendor_ticket_add(1, "Gala", 3, 25.0, 3);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "VENDOR_TICKET_ADD");
        assert!(value["message"]
            .as_str()
            .unwrap()
            .contains("Vendor 1 added 3 tickets for event Gala"));
        assert_eq!(value["details"]["currentTickets"], 3);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_reset_routes_to_both_topics() {
        let message = FeedMessage::system_reset();
        assert_eq!(
            message.topics(),
            &[FeedTopic::SystemUpdates, FeedTopic::TicketUpdates]
        );
    }

    #[test]
    fn test_purchase_routes_to_ticket_updates_only() {
        let message = FeedMessage::ticket_purchase(4, 2, &["A".to_string()], 10.0, 0);
        assert_eq!(message.topics(), &[FeedTopic::TicketUpdates]);
    }

    #[test]
    fn test_filter_semantics() {
        let purchase = FeedMessage::ticket_purchase(1, 1, &["A".to_string()], 5.0, 0);
        let start = FeedMessage::system_start();

        let everything = FeedFilter::all();
        assert!(everything.matches(&purchase));
        assert!(everything.matches(&start));

        let tickets_only = FeedFilter::topics(vec![FeedTopic::TicketUpdates]);
        assert!(tickets_only.matches(&purchase));
        assert!(!tickets_only.matches(&start));

        let reset = FeedMessage::system_reset();
        assert!(tickets_only.matches(&reset));
    }
}
