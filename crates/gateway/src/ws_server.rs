//! Subscribe-stream handler using axum WebSockets.

use crate::api::AppState;
use crate::protocol::{ErrorReply, SlotPush};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use dispatcher::Subscriber;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use model::{Appointment, CriterionSpec};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outbound messages buffered per client before pushes are dropped.
const CLIENT_CHANNEL_BUFFER_SIZE: usize = 256;

/// One connected stream client. Outbound traffic goes through a bounded
/// channel drained by the forwarding task, so `deliver` never blocks the
/// refresh cycle on a slow consumer.
pub struct WsClient {
    pub id: Uuid,
    tx: mpsc::Sender<Message>,
}

impl WsClient {
    fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Serialize once and enqueue; a full buffer drops the message.
    fn send_json<T: Serialize>(&self, payload: &T) {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(err) => {
                warn!("failed to serialize push for client {}: {err}", self.id);
                return;
            }
        };
        if self.tx.try_send(Message::Text(json.into())).is_err() {
            debug!("dropping push for slow client {}", self.id);
            counter!("gateway_pushes_dropped_total").increment(1);
        }
    }
}

impl Subscriber for WsClient {
    fn deliver(&self, added: &[Appointment], removed: &[Appointment]) {
        self.send_json(&SlotPush::new(added.to_vec(), removed.to_vec()));
        counter!("gateway_pushes_total").increment(1);
    }
}

/// WebSocket upgrade handler for `/appointments/ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Drive one connection: criteria messages in, pushes out, teardown that
/// unregisters exactly once whether the client, an error, or server
/// shutdown closed the stream first.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(CLIENT_CHANNEL_BUFFER_SIZE);
    let client = Arc::new(WsClient::new(tx));
    let client_id = client.id;
    let mut shutdown = state.shutdown.clone();

    counter!("gateway_connections_total").increment(1);
    info!("client {client_id} connected to the subscribe stream");

    // Forward queued messages onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            biased;

            // Server shutdown closes every open stream.
            _ = shutdown.changed() => {
                debug!("closing client {client_id} on server shutdown");
                break;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_criteria_message(&state, &client, &text);
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => handle_criteria_message(&state, &client, text),
                        Err(_) => client.send_json(&ErrorReply::malformed()),
                    },
                    // axum answers pings on its own.
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        warn!("websocket error for client {client_id}: {err}");
                        break;
                    }
                }
            }
        }
    }

    // Teardown runs whichever side closed first; unregister is idempotent.
    state.dispatcher.unregister(client_id);
    send_task.abort();

    counter!("gateway_disconnections_total").increment(1);
    gauge!("gateway_active_subscriptions").set(state.dispatcher.subscription_count() as f64);
    info!("client {client_id} disconnected");
}

/// One inbound message: a JSON array of criteria, fully replacing the
/// subscription. Any failure leaves the subscription state unchanged.
fn handle_criteria_message(state: &Arc<AppState>, client: &Arc<WsClient>, text: &str) {
    let specs: Vec<CriterionSpec> = match serde_json::from_str(text) {
        Ok(specs) => specs,
        Err(err) => {
            debug!("client {} sent a malformed payload: {err}", client.id);
            client.send_json(&ErrorReply::malformed());
            return;
        }
    };

    match state
        .dispatcher
        .register(client.id, &specs, client.clone() as Arc<dyn Subscriber>)
    {
        Ok(()) => {
            gauge!("gateway_active_subscriptions")
                .set(state.dispatcher.subscription_count() as f64);
        }
        Err(err) => {
            debug!("client {} sent invalid criteria: {err}", client.id);
            client.send_json(&ErrorReply::validation(err.to_string()));
        }
    }
}
