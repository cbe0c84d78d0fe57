//! # API Gateway - HTTP Control Surface and Live Feed
//!
//! A thin validation shell over the ticket engine:
//!
//! - REST endpoints for configure / start / stop / reset / status /
//!   availability
//! - A WebSocket feed endpoint relaying the shared bus to browser clients
//! - A permissive CORS layer
//!
//! The gateway holds no marketplace state of its own; every handler
//! delegates to the lifecycle controller or reads the stores, and every
//! error is mapped to the HTTP contract (validation and illegal transitions
//! to 400, missing configuration to 404, anything unexpected to 500).

pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::{CorsConfig, GatewayConfig, GatewayConfigError};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
