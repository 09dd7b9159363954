//! Realtime event channel over WebSocket.
//!
//! A single broadcast hub fans server-side events (for example
//! `question-added`) out to every connected client. Incoming client traffic
//! is drained and ignored except for close frames; the message-level
//! protocol beyond that is the frontend's concern.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use super::AppState;

/// Broadcast hub for server events. Cheap to clone.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<String>,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    event: &'a str,
    data: T,
}

impl EventHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Publish an event to all connected clients. Dropped silently when
    /// nobody is listening or the payload fails to serialize.
    pub fn publish<T: Serialize>(&self, event: &str, data: T) {
        match serde_json::to_string(&Envelope { event, data }) {
            Ok(message) => {
                let _ = self.tx.send(message);
            }
            Err(err) => debug!("failed to serialize {event} event: {err}"),
        }
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    let (mut sink, mut stream) = socket.split();

    let mut forward = tokio::spawn(async move {
        // A lagged receiver skips missed events and keeps going
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if sink.send(Message::Text(event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("websocket client lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut drain = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    // Whichever side finishes first tears the connection down
    tokio::select! {
        _ = &mut forward => drain.abort(),
        _ = &mut drain => forward.abort(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();

        hub.publish("question-added", serde_json::json!({ "id": "abc123" }));

        let message = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&message).unwrap();
        assert_eq!(value["event"], "question-added");
        assert_eq!(value["data"]["id"], "abc123");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let hub = EventHub::new(8);
        assert_eq!(hub.client_count(), 0);
        // Must not panic or error
        hub.publish("question-added", serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_each_subscriber_gets_every_event() {
        let hub = EventHub::new(8);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.client_count(), 2);

        hub.publish("question-added", serde_json::json!({ "id": "x" }));

        assert!(a.recv().await.unwrap().contains("\"id\":\"x\""));
        assert!(b.recv().await.unwrap().contains("\"id\":\"x\""));
    }
}
