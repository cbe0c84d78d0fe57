//! REST handlers and router assembly.
//!
//! Response bodies and field-level validation details follow the control
//! surface contract exactly; handlers stay thin and delegate to the
//! lifecycle controller.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use shared_types::ConfigureRequest;

use crate::config::CorsConfig;
use crate::cors::create_cors_layer;
use crate::error::ApiError;
use crate::state::AppState;
use crate::ws;

/// Builds the gateway router.
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/api/system-configuration/configure", post(configure))
        .route("/api/ticket-system-control/start", post(start))
        .route("/api/ticket-system-control/stop", post(stop))
        .route("/api/ticket-system-control/reset", post(reset))
        .route("/api/system-status", get(system_status))
        .route("/api/ticket-availability", get(ticket_availability))
        .route("/ws-ticket-system", get(ws::ws_handler))
        .layer(create_cors_layer(cors))
        .with_state(state)
}

/// POST `/api/system-configuration/configure`
///
/// Validates the whole request before touching any state; all violations are
/// reported together. On success the event catalog is replaced and the
/// configuration stored.
async fn configure(
    State(state): State<AppState>,
    Json(request): Json<ConfigureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received system configuration request");

    let config = request.validate()?;
    let events = state.controller.configure(config.clone())?;

    info!(
        max_capacity = config.max_capacity,
        total_tickets = config.total_tickets,
        release_rate = config.release_rate,
        retrieval_rate = config.retrieval_rate,
        events = events.len(),
        "System configuration completed successfully"
    );

    Ok(Json(json!({
        "message": "System configured successfully",
        "maxCapacity": config.max_capacity,
        "totalTickets": config.total_tickets,
        "releaseRate": config.release_rate,
        "retrievalRate": config.retrieval_rate,
        "events": events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
    })))
}

/// POST `/api/ticket-system-control/start`
async fn start(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.controller.start()?;
    Ok("Ticket system started")
}

/// POST `/api/ticket-system-control/stop`
async fn stop(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.controller.stop().await?;
    Ok("Ticket system stopped successfully")
}

/// POST `/api/ticket-system-control/reset`
async fn reset(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.controller.reset().await;
    Ok("Ticket system reset successfully")
}

/// GET `/api/system-status`
///
/// The latest accepted configuration and the event catalog; 404 while
/// neither exists (fresh or reset system).
async fn system_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let config = state
        .config_store
        .current()
        .ok_or_else(|| ApiError::NotFound("No system configuration available".to_string()))?;

    let events = state.event_store.list();
    if events.is_empty() {
        return Err(ApiError::NotFound("No events available".to_string()));
    }

    Ok(Json(json!({
        "totalTickets": config.total_tickets,
        "releaseRate": config.release_rate,
        "retrievalRate": config.retrieval_rate,
        "maxCapacity": config.max_capacity,
        "events": events
            .iter()
            .map(|e| json!({ "name": e.name, "price": e.price }))
            .collect::<Vec<_>>(),
    })))
}

/// GET `/api/ticket-availability`
///
/// A consistent snapshot of per-event availability and the three counters.
/// Configured events with no held tickets are reported explicitly at zero.
/// Readers should treat the triple as eventually consistent with respect to
/// in-flight operations.
async fn ticket_availability(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.controller.snapshot();

    let mut availability = snapshot.availability;
    for event in state.event_store.list() {
        availability.entry(event.name).or_insert(0);
    }

    Ok(Json(json!({
        "availability": availability,
        "ticketsAdded": snapshot.tickets_added,
        "currentTickets": snapshot.current_tickets,
        "ticketsSold": snapshot.tickets_sold,
    })))
}
