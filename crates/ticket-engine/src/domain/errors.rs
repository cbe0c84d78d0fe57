//! Engine error types.
//!
//! Every variant is a client-visible condition; the messages are the exact
//! strings the control surface returns.

use thiserror::Error;

/// Errors surfaced by the lifecycle controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `start` while a run is active.
    #[error("Ticket system is already running. Please reset first.")]
    AlreadyRunning,

    /// `start` after the supply sold out; only `reset` clears this.
    #[error("All tickets have been sold. System must be reset before restarting.")]
    MustReset,

    /// `stop` while no run is active. Doubles as the idempotence indicator:
    /// the second consecutive `stop` reports this without changing state.
    #[error("Ticket system is not running.")]
    NotRunning,

    /// `start` with no accepted configuration.
    #[error("No system configuration found. Cannot start ticket system.")]
    NoConfiguration,

    /// `start` with a configuration but no events (cleared by reset).
    #[error("No events configured. Cannot start ticket system.")]
    NoEvents,

    /// `configure` while a run is active; the active run's configuration is
    /// immutable.
    #[error("Ticket system is running. Stop or reset before reconfiguring.")]
    ReconfigureWhileRunning,
}
