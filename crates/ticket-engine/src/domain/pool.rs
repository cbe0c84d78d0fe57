//! # Ticket Pool - Bounded FIFO Buffer Between Vendors and Customers
//!
//! The shared monitor at the center of the marketplace.
//!
//! ## Data Structures
//!
//! - `tickets`: FIFO queue, consumption order equals deposit order
//! - `tickets_added` / `tickets_sold`: cumulative counters
//! - `available`: counting semaphore, one permit per held ticket signal
//!
//! ## Invariants Enforced
//!
//! - `tickets.len() == tickets_added - tickets_sold` (single lock around
//!   every mutation)
//! - `tickets_added <= total_tickets` (deposit clamp)
//! - `tickets_sold <= tickets_added` (withdraw pops only held tickets)
//! - exhausted exactly when `tickets_sold == total_tickets` and the queue
//!   is empty (checked after every purchase)
//! - one persisted transaction per consumed ticket (batched append while
//!   the lock is held)
//!
//! ## Mutual Exclusion Discipline
//!
//! All state mutation happens under one `parking_lot::Mutex`. Feed messages
//! for deposits and purchases are published while the lock is held, so the
//! feed order matches the serialization order of pool mutations. Publishing
//! is synchronous and never blocks; no await happens under the lock.
//!
//! ## Availability Signalling
//!
//! The semaphore starts at zero and gains one permit per deposited ticket.
//! `withdraw` takes a single permit per wake regardless of batch size and
//! hands it back when it declines to mutate (stopped or empty); the
//! under-lock emptiness re-check absorbs the resulting permit/ticket drift.
//! Halting adds one extra permit per customer so every blocked consumer
//! wakes, observes the stop, and drains.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use shared_bus::{FeedMessage, FeedSink};
use shared_types::{LifecycleState, NewTransaction, PoolSnapshot, SystemConfig, Ticket};

use super::errors::EngineError;
use crate::ports::TransactionStore;

/// Limits of the active run, fixed at arm time.
#[derive(Debug, Clone, Copy)]
struct RunLimits {
    /// Tickets to release over the whole run.
    total_tickets: u64,
    /// Ceiling on simultaneously held tickets.
    max_capacity: u64,
}

/// Everything guarded by the pool lock.
#[derive(Default)]
struct PoolState {
    /// Held tickets in deposit order.
    tickets: VecDeque<Ticket>,
    /// Cumulative deposited count.
    tickets_added: u64,
    /// Cumulative purchased count.
    tickets_sold: u64,
    /// A run is active.
    running: bool,
    /// A run was halted (manually or by exhaustion).
    stopped: bool,
    /// The whole supply was produced and sold.
    all_tickets_sold: bool,
    /// Limits of the active run; `None` until armed.
    limits: Option<RunLimits>,
    /// Token cancelled when the pool halts itself on exhaustion.
    run_token: Option<CancellationToken>,
    /// Extra permits released on halt, one per potential waiter.
    drain_permits: u32,
}

/// Result of a deposit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Tickets actually appended (after clamping).
    pub deposited: usize,
    /// The cumulative supply is fully released; the vendor should stop.
    pub supply_exhausted: bool,
}

/// Result of a withdraw call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawOutcome {
    /// Tickets actually purchased (after clamping).
    pub purchased: usize,
    /// Event name of each purchased ticket, in consumption order.
    pub event_names: Vec<String>,
    /// Sum of the purchased tickets' prices.
    pub total_price: f64,
}

/// Thread-safe bounded buffer between vendor and customer workers.
pub struct TicketPool {
    /// The monitor lock.
    state: Mutex<PoolState>,
    /// Availability semaphore, replaced wholesale on `clear`.
    available: Mutex<Arc<Semaphore>>,
    /// Live feed sink; written while the state lock is held.
    bus: Arc<dyn FeedSink>,
    /// Append-only purchase log.
    transactions: Arc<dyn TransactionStore>,
}

impl TicketPool {
    /// Creates an empty, un-armed pool.
    pub fn new(bus: Arc<dyn FeedSink>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            available: Mutex::new(Arc::new(Semaphore::new(0))),
            bus,
            transactions,
        }
    }

    fn semaphore(&self) -> Arc<Semaphore> {
        self.available.lock().clone()
    }

    /// Arms the pool for a new run.
    ///
    /// Leftover tickets and counters from a stopped (not reset) run are kept;
    /// the run resumes toward the same `total_tickets`. `run_token` is
    /// cancelled by the pool itself when the supply sells out;
    /// `customer_count` sizes the drain release on halt.
    pub fn arm(&self, config: &SystemConfig, run_token: CancellationToken, customer_count: u32) {
        let mut state = self.state.lock();
        state.limits = Some(RunLimits {
            total_tickets: u64::from(config.total_tickets),
            max_capacity: u64::from(config.max_capacity),
        });
        state.running = true;
        state.stopped = false;
        state.all_tickets_sold = false;
        state.run_token = Some(run_token);
        state.drain_permits = customer_count;
    }

    /// Deposits up to `requested` tickets for `event_name`.
    ///
    /// The batch is clamped to the unreleased remainder of the supply (and to
    /// the capacity headroom, which the configuration invariant
    /// `total <= capacity` makes at least as large). Signals one permit per
    /// appended ticket and emits the deposit on the feed while the lock is
    /// held.
    pub fn deposit(
        &self,
        vendor_id: u32,
        event_name: &str,
        unit_price: f64,
        requested: usize,
    ) -> DepositReceipt {
        let mut state = self.state.lock();
        let Some(limits) = state.limits else {
            return DepositReceipt {
                deposited: 0,
                supply_exhausted: false,
            };
        };
        if state.stopped {
            return DepositReceipt {
                deposited: 0,
                supply_exhausted: false,
            };
        }

        let remaining = limits.total_tickets.saturating_sub(state.tickets_added);
        let headroom = limits.max_capacity.saturating_sub(state.tickets.len() as u64);
        if remaining == 0 {
            return DepositReceipt {
                deposited: 0,
                supply_exhausted: true,
            };
        }
        if requested == 0 {
            return DepositReceipt {
                deposited: 0,
                supply_exhausted: false,
            };
        }

        let deposited = (requested as u64).min(remaining).min(headroom) as usize;
        for _ in 0..deposited {
            state
                .tickets
                .push_back(Ticket::new(event_name, unit_price, vendor_id));
        }
        state.tickets_added += deposited as u64;
        self.semaphore().add_permits(deposited);

        let current = state.tickets.len() as u64;
        self.bus.publish(FeedMessage::vendor_ticket_add(
            vendor_id, event_name, deposited, unit_price, current,
        ));

        DepositReceipt {
            deposited,
            supply_exhausted: state.tickets_added >= limits.total_tickets,
        }
    }

    /// Withdraws up to `requested` tickets for `customer_id`.
    ///
    /// Suspends until a ticket has been signalled or the pool leaves the
    /// running state. An empty outcome means nothing was purchased; the
    /// caller decides whether to retry (still running) or exit.
    pub async fn withdraw(&self, customer_id: u32, requested: usize) -> WithdrawOutcome {
        if requested == 0 {
            return WithdrawOutcome::default();
        }
        {
            let state = self.state.lock();
            if state.stopped || !state.running {
                return WithdrawOutcome::default();
            }
        }

        let semaphore = self.semaphore();
        let Ok(permit) = semaphore.acquire_owned().await else {
            // Semaphore closed by `clear`; nothing left to purchase.
            return WithdrawOutcome::default();
        };

        let mut state = self.state.lock();
        if state.stopped || state.tickets.is_empty() {
            // Hand the permit back so other waiters can wake and observe
            // the same condition.
            drop(permit);
            return WithdrawOutcome::default();
        }

        let take = requested.min(state.tickets.len());
        let mut outcome = WithdrawOutcome::default();
        let mut records = Vec::with_capacity(take);
        while outcome.purchased < take {
            let Some(ticket) = state.tickets.pop_front() else {
                break;
            };
            state.tickets_sold += 1;
            outcome.purchased += 1;
            outcome.total_price += ticket.price;
            records.push(NewTransaction::for_ticket(&ticket, customer_id));
            outcome.event_names.push(ticket.event_name);
        }
        self.transactions.append_all(records);
        permit.forget();

        let current = state.tickets.len() as u64;
        self.bus.publish(FeedMessage::ticket_purchase(
            customer_id,
            outcome.purchased,
            &outcome.event_names,
            outcome.total_price,
            current,
        ));

        let total = state.limits.map(|l| l.total_tickets).unwrap_or(0);
        if total > 0 && state.tickets_sold >= total && state.tickets.is_empty() {
            state.all_tickets_sold = true;
            self.bus
                .publish(FeedMessage::system_status("All tickets have been sold."));
            self.finish_locked(&mut state);
        }

        outcome
    }

    /// Halts the active run.
    ///
    /// Returns the run totals `(tickets_added, tickets_sold)`, or
    /// [`EngineError::NotRunning`] when no run is active (which makes a
    /// second consecutive halt a no-op with an indicator).
    pub fn halt(&self) -> Result<(u64, u64), EngineError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(EngineError::NotRunning);
        }
        self.finish_locked(&mut state);
        Ok((state.tickets_added, state.tickets_sold))
    }

    /// Common halt path, shared by `halt` and the exhaustion check.
    ///
    /// Flips the flags, announces the stop, cancels the run token, and
    /// releases one permit per potential waiter so blocked consumers drain.
    fn finish_locked(&self, state: &mut PoolState) {
        state.running = false;
        state.stopped = true;

        self.bus.publish(FeedMessage::system_stop(
            state.tickets_added,
            state.tickets_sold,
        ));

        if let Some(token) = state.run_token.take() {
            token.cancel();
        }
        self.semaphore().add_permits(state.drain_permits as usize);
    }

    /// Drops all tickets, zeroes counters, clears flags and limits.
    ///
    /// Only the lifecycle controller calls this, under reset. The old
    /// semaphore is closed so any straggling waiter wakes with an empty
    /// outcome.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.tickets.clear();
        state.tickets_added = 0;
        state.tickets_sold = 0;
        state.running = false;
        state.stopped = false;
        state.all_tickets_sold = false;
        state.limits = None;
        state.run_token = None;
        state.drain_permits = 0;

        let old = std::mem::replace(&mut *self.available.lock(), Arc::new(Semaphore::new(0)));
        old.close();
    }

    /// Consistent point-in-time view of per-event counts and counters.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        let mut availability: BTreeMap<String, u64> = BTreeMap::new();
        for ticket in &state.tickets {
            *availability.entry(ticket.event_name.clone()).or_insert(0) += 1;
        }
        PoolSnapshot {
            availability,
            tickets_added: state.tickets_added,
            current_tickets: state.tickets.len() as u64,
            tickets_sold: state.tickets_sold,
        }
    }

    /// The lifecycle state derived from the pool flags.
    ///
    /// Exhaustion dominates: once the supply sold out, only `clear` (via
    /// reset) leaves the state.
    pub fn state(&self) -> LifecycleState {
        let state = self.state.lock();
        if state.all_tickets_sold {
            LifecycleState::Exhausted
        } else if state.running {
            LifecycleState::Running
        } else if state.stopped {
            LifecycleState::Stopped
        } else {
            LifecycleState::Idle
        }
    }

    /// Whether a run is active.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Whether the whole supply was produced and sold.
    pub fn all_tickets_sold(&self) -> bool {
        self.state.lock().all_tickets_sold
    }
}
