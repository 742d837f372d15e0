//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and turns socket activity into hub
//! callbacks: open → connect, text frame → message / ack, close → disconnect.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::AppState;
use crate::chat::{ChatHub, ClientMessage, ConnectionId, ServerMessage};

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ChatHub>) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = hub.reserve().await;
    if let Err(e) = hub.connect(connection_id.clone(), tx).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Connection rejected");
        let error_msg = ServerMessage::Error {
            message: e.to_string(),
        };
        if let Ok(text) = serde_json::to_string(&error_msg) {
            let _ = sender.send(Message::Text(text)).await;
        }
        let _ = sender.close().await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.disconnect(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &ChatHub, connection_id: &ConnectionId, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match parse_frame(&text) {
                Ok(client_msg) => handle_client_message(hub, connection_id, client_msg).await,
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Send error but keep connection open
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            hub.send_to(connection_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Parse a text frame.
///
/// JSON objects are decoded as a tagged [`ClientMessage`]. Anything else,
/// including bare JSON scalars such as `42` or `"quoted"`, is taken as a
/// plain chat message.
fn parse_frame(text: &str) -> Result<ClientMessage, serde_json::Error> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value(value),
        _ => Ok(ClientMessage::Message {
            text: text.to_string(),
        }),
    }
}

/// Handle a parsed client message
async fn handle_client_message(hub: &ChatHub, connection_id: &ConnectionId, message: ClientMessage) {
    match message {
        ClientMessage::Message { text } => {
            hub.message(connection_id, &text).await;
        }
        ClientMessage::Ack(payload) => {
            // Deviations are already logged by the hub
            let _ = hub.acknowledge(connection_id, &payload).await;
        }
        ClientMessage::Ping => {
            hub.send_to(connection_id, ServerMessage::Pong).await;
        }
    }
}
