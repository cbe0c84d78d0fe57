//! WebSocket feed endpoint.
//!
//! Clients connect at `/ws-ticket-system` and opt into topics with JSON
//! control frames:
//!
//! ```text
//! → { "subscribe": "ticket-updates" }
//! ← { "subscribed": "ticket-updates" }
//! → { "unsubscribe": "ticket-updates" }
//! ← { "unsubscribed": "ticket-updates" }
//! ```
//!
//! Subscribed feed envelopes are forwarded verbatim as text frames. Delivery
//! is best effort: a connection that cannot keep up loses messages rather
//! than slowing the bus down.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_bus::{FeedFilter, FeedTopic, InMemoryFeedBus};

use crate::state::AppState;

/// GET `/ws-ticket-system`
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let bus = Arc::clone(&state.bus);
    ws.on_upgrade(move |socket| handle_socket(socket, bus))
}

/// Drives one connection until the client leaves or the transport fails.
async fn handle_socket(socket: WebSocket, bus: Arc<InMemoryFeedBus>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "New WebSocket connection");

    // One bus subscription per connection; the client's topic choices are
    // applied on this side so re-subscribing never tears the channel down.
    let mut subscription = bus.subscribe(FeedFilter::all());
    let mut topics: HashSet<FeedTopic> = HashSet::new();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(message)) = incoming else {
                    break;
                };
                match message {
                    Message::Text(text) => {
                        let reply = handle_control_frame(&text, &mut topics, connection_id);
                        if sender.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                    Message::Ping(data) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => {
                        debug!(%connection_id, "WebSocket close received");
                        break;
                    }
                    _ => {}
                }
            }
            published = subscription.recv() => {
                let Some(feed_message) = published else {
                    break;
                };
                if !feed_message.topics().iter().any(|t| topics.contains(t)) {
                    continue;
                }
                match serde_json::to_string(&feed_message) {
                    Ok(text) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(%connection_id, error = %e, "Failed to encode feed message"),
                }
            }
        }
    }

    info!(%connection_id, "WebSocket connection closed");
}

/// Applies one JSON control frame and returns the reply to send.
fn handle_control_frame(
    text: &str,
    topics: &mut HashSet<FeedTopic>,
    connection_id: Uuid,
) -> String {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return json!({ "error": format!("Parse error: {e}") }).to_string(),
    };

    if let Some(name) = value.get("subscribe").and_then(Value::as_str) {
        return match FeedTopic::parse(name) {
            Some(topic) => {
                topics.insert(topic);
                debug!(%connection_id, topic = name, "Subscribed");
                json!({ "subscribed": name }).to_string()
            }
            None => json!({ "error": format!("Unknown topic: {name}") }).to_string(),
        };
    }

    if let Some(name) = value.get("unsubscribe").and_then(Value::as_str) {
        return match FeedTopic::parse(name) {
            Some(topic) => {
                topics.remove(&topic);
                debug!(%connection_id, topic = name, "Unsubscribed");
                json!({ "unsubscribed": name }).to_string()
            }
            None => json!({ "error": format!("Unknown topic: {name}") }).to_string(),
        };
    }

    json!({ "error": "Unsupported message" }).to_string()
}
