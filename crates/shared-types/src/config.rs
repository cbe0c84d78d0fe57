//! System configuration: wire-level request, validation, accepted form.
//!
//! [`ConfigureRequest`] mirrors the JSON body of the configure endpoint and
//! tolerates absent fields so every problem can be reported per field in one
//! response. [`SystemConfig`] is the accepted, invariant-bearing form: once
//! constructed it is immutable until reset.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::EventSpec;
use crate::errors::ValidationErrors;

/// An accepted marketplace configuration.
///
/// Invariants (guaranteed by [`ConfigureRequest::validate`]):
/// - `max_capacity > 0`
/// - `0 < total_tickets <= max_capacity`
/// - at least one event; event names unique and non-empty; prices positive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// Ceiling on tickets simultaneously held in the pool.
    pub max_capacity: u32,
    /// Total tickets to be released over the whole run.
    pub total_tickets: u32,
    /// Upper bound on a vendor's per-step batch; inverse factor on cadence.
    pub release_rate: u32,
    /// Upper bound on a customer's per-step batch; inverse factor on cadence.
    pub retrieval_rate: u32,
    /// Events on sale, in configuration order.
    pub events: Vec<EventSpec>,
}

impl SystemConfig {
    /// Release rate clamped to at least 1 so batch ranges and cadence
    /// divisions stay well-defined when the configured rate is 0.
    pub fn effective_release_rate(&self) -> u32 {
        self.release_rate.max(1)
    }

    /// Retrieval rate clamped to at least 1, same reasoning as
    /// [`Self::effective_release_rate`].
    pub fn effective_retrieval_rate(&self) -> u32 {
        self.retrieval_rate.max(1)
    }
}

/// One event entry as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSpecRequest {
    /// Event name; must be non-empty and unique within the request.
    pub name: Option<String>,
    /// Ticket price; must be strictly positive.
    pub price: Option<f64>,
}

/// The raw configure-endpoint body.
///
/// Every field is optional at the wire level; [`Self::validate`] turns the
/// request into a [`SystemConfig`] or a full list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureRequest {
    /// Requested pool capacity ceiling.
    pub max_capacity: Option<i64>,
    /// Requested total ticket supply.
    pub total_tickets: Option<i64>,
    /// Requested vendor release rate.
    pub release_rate: Option<i64>,
    /// Requested customer retrieval rate.
    pub retrieval_rate: Option<i64>,
    /// Requested events.
    pub events: Option<Vec<EventSpecRequest>>,
}

impl ConfigureRequest {
    /// Validates the request and produces the accepted configuration.
    ///
    /// Collects every violation rather than failing fast, so a single
    /// response can report all of them. No state is touched on failure.
    pub fn validate(&self) -> Result<SystemConfig, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        match self.max_capacity {
            None => errors.push("maxCapacity", "Maximum ticket capacity must be provided"),
            Some(v) if v <= 0 => errors.push(
                "maxCapacity",
                "Maximum ticket capacity must be a positive number",
            ),
            Some(_) => {}
        }

        match self.release_rate {
            None => errors.push("releaseRate", "Release rate must be provided"),
            Some(v) if v < 0 => errors.push("releaseRate", "Release rate cannot be negative"),
            Some(_) => {}
        }

        match self.retrieval_rate {
            None => errors.push("retrievalRate", "Retrieval rate must be provided"),
            Some(v) if v < 0 => errors.push("retrievalRate", "Retrieval rate cannot be negative"),
            Some(_) => {}
        }

        match self.total_tickets {
            None => errors.push("totalTickets", "Total tickets must be provided"),
            Some(v) if v <= 0 => {
                errors.push("totalTickets", "Total tickets must be a positive number")
            }
            Some(_) => {}
        }

        if let (Some(max), Some(total)) = (self.max_capacity, self.total_tickets) {
            if total > max {
                errors.push("tickets", "Total tickets cannot exceed maximum ticket capacity");
            }
        }

        let mut accepted_events = Vec::new();
        match self.events.as_deref() {
            None | Some([]) => errors.push("events", "At least one event must be configured"),
            Some(events) => {
                let mut seen: HashSet<&str> = HashSet::new();
                for (i, event) in events.iter().enumerate() {
                    let name = event.name.as_deref().map(str::trim).unwrap_or("");
                    if name.is_empty() {
                        errors.push(format!("events[{i}].name"), "Event name cannot be empty");
                    } else if !seen.insert(name) {
                        errors.push(format!("events[{i}].name"), "Duplicate event names");
                    }

                    match event.price {
                        None => errors.push(
                            format!("events[{i}].price"),
                            "Event price must be provided",
                        ),
                        Some(p) if p <= 0.0 => errors.push(
                            format!("events[{i}].price"),
                            "Event price must be a positive number",
                        ),
                        Some(_) => {}
                    }

                    if !name.is_empty() {
                        accepted_events.push(EventSpec {
                            name: name.to_string(),
                            price: event.price.unwrap_or_default(),
                        });
                    }
                }
            }
        }

        errors.into_result()?;

        // All options are present and in range once the error list is empty.
        Ok(SystemConfig {
            max_capacity: self.max_capacity.unwrap_or_default() as u32,
            total_tickets: self.total_tickets.unwrap_or_default() as u32,
            release_rate: self.release_rate.unwrap_or_default() as u32,
            retrieval_rate: self.retrieval_rate.unwrap_or_default() as u32,
            events: accepted_events,
        })
    }
}
