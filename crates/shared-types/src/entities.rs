//! # Core Domain Entities
//!
//! The vocabulary of the marketplace: events on sale, tickets moving through
//! the pool, completed transactions, and the lifecycle states of a run.
//!
//! ## Clusters
//!
//! - **Catalog**: [`Event`], [`EventSpec`]
//! - **Flow**: [`Ticket`], [`NewTransaction`], [`Transaction`]
//! - **Observation**: [`PoolSnapshot`], [`LifecycleState`]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event for which tickets are sold.
///
/// Created when a configuration is accepted, destroyed on reset. The `id` is
/// assigned by the event store from its resettable identity counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identity.
    pub id: u64,
    /// Unique, non-empty event name.
    pub name: String,
    /// Ticket price, strictly positive.
    pub price: f64,
}

/// The configuration-time description of an event (no identity yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Unique, non-empty event name.
    pub name: String,
    /// Ticket price, strictly positive.
    pub price: f64,
}

/// A single ticket held in the pool.
///
/// Produced by exactly one vendor, consumed by exactly one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Name of the event this ticket admits to.
    pub event_name: String,
    /// Price the ticket was released at.
    pub price: f64,
    /// Vendor that deposited the ticket.
    pub vendor_id: u32,
}

impl Ticket {
    /// Creates a ticket for `event_name` released by `vendor_id`.
    pub fn new(event_name: impl Into<String>, price: f64, vendor_id: u32) -> Self {
        Self {
            event_name: event_name.into(),
            price,
            vendor_id,
        }
    }
}

/// A purchase record before the transaction log has assigned it an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Event the purchased ticket belongs to.
    pub event_name: String,
    /// Price paid for the ticket.
    pub price: f64,
    /// Vendor that released the ticket.
    pub vendor_id: u32,
    /// Customer that bought the ticket.
    pub customer_id: u32,
    /// Always 1: one record per consumed ticket.
    pub ticket_count: u32,
}

impl NewTransaction {
    /// Builds the purchase record for one consumed ticket.
    pub fn for_ticket(ticket: &Ticket, customer_id: u32) -> Self {
        Self {
            event_name: ticket.event_name.clone(),
            price: ticket.price,
            vendor_id: ticket.vendor_id,
            customer_id,
            ticket_count: 1,
        }
    }
}

/// A completed, persisted purchase. Append-only until reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Log-assigned identity.
    pub id: u64,
    /// Event the purchased ticket belongs to.
    pub event_name: String,
    /// Price paid for the ticket.
    pub price: f64,
    /// Vendor that released the ticket.
    pub vendor_id: u32,
    /// Customer that bought the ticket.
    pub customer_id: u32,
    /// Always 1: one record per consumed ticket.
    pub ticket_count: u32,
    /// When the purchase completed.
    pub timestamp: DateTime<Utc>,
}

/// A consistent point-in-time view of the pool.
///
/// All four fields are read under a single lock acquisition, so the identity
/// `current_tickets == tickets_added - tickets_sold` holds within one
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    /// Tickets currently in the pool, per event name.
    pub availability: BTreeMap<String, u64>,
    /// Cumulative tickets deposited by vendors.
    pub tickets_added: u64,
    /// Tickets currently in the pool.
    pub current_tickets: u64,
    /// Cumulative tickets purchased by customers.
    pub tickets_sold: u64,
}

/// The lifecycle of a marketplace run.
///
/// Exactly one state describes the system at any time:
///
/// ```text
/// [Idle] ──start──→ [Running] ──stop──→ [Stopped] ──start──→ [Running]
///                       │                    │
///                 (all tickets sold)       reset
///                       ↓                    ↓
///                  [Exhausted] ──reset──→ [Idle]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    /// No run has happened since construction or the last reset.
    Idle,
    /// Vendors and customers are active.
    Running,
    /// A run was halted before the supply sold out.
    Stopped,
    /// Every configured ticket was produced and sold; only reset leaves
    /// this state.
    Exhausted,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Exhausted => "EXHAUSTED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_from_ticket() {
        let ticket = Ticket::new("Rock Night", 12.5, 3);
        let tx = NewTransaction::for_ticket(&ticket, 7);

        assert_eq!(tx.event_name, "Rock Night");
        assert_eq!(tx.price, 12.5);
        assert_eq!(tx.vendor_id, 3);
        assert_eq!(tx.customer_id, 7);
        assert_eq!(tx.ticket_count, 1);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = PoolSnapshot {
            availability: BTreeMap::from([("A".to_string(), 2)]),
            tickets_added: 5,
            current_tickets: 2,
            tickets_sold: 3,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["ticketsAdded"], 5);
        assert_eq!(json["currentTickets"], 2);
        assert_eq!(json["ticketsSold"], 3);
        assert_eq!(json["availability"]["A"], 2);
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(LifecycleState::Idle.to_string(), "IDLE");
        assert_eq!(LifecycleState::Exhausted.to_string(), "EXHAUSTED");
    }
}
