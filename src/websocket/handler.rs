use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::models::{ClientMessage, ErrorMessage, ServerMessage};
use crate::ws::{ConnId, Outbox, SessionGateway};
use super::msg_edit_handler::handle_edit_message;
use super::msg_join_handler::handle_join_message;
use super::msg_leave_handler::handle_leave_message;
use super::msg_ping_handler::handle_ping_message;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    debug!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.gateway.clone()))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, gateway: Arc<SessionGateway>) {
    let (outbox, mut queue) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_id = gateway.connect(outbox.clone()).await;
    info!("WebSocket connection established with connection_id: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();

    // Drain this connection's queue onto the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = queue.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize message for connection {}: {}", conn_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Read client events until the socket closes or errors
    let recv_gateway = gateway.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            match frame {
                Message::Text(text) => handle_text(&text, conn_id, &recv_gateway, &outbox).await,
                Message::Close(_) => break,
                _ => continue,
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    gateway.disconnect(conn_id).await;
    info!("WebSocket connection {} terminated", conn_id);
}

async fn handle_text(text: &str, conn_id: ConnId, gateway: &SessionGateway, outbox: &Outbox) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(client_msg) => client_msg,
        Err(e) => {
            warn!("Failed to parse message on connection {}: {}", conn_id, e);
            reply_error(outbox, format!("Malformed message: {}", e));
            return;
        }
    };

    let result = match &client_msg {
        ClientMessage::JoinNote(join_msg) => handle_join_message(join_msg, conn_id, gateway).await,
        ClientMessage::LeaveNote(leave_msg) => handle_leave_message(leave_msg, conn_id, gateway).await,
        ClientMessage::EditNote(edit_msg) => handle_edit_message(edit_msg, conn_id, gateway).await,
        ClientMessage::Ping(ping_msg) => {
            handle_ping_message(ping_msg, conn_id, outbox);
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!("Rejected message on connection {}: {}", conn_id, e);
        reply_error(outbox, e.to_string());
    }
}

fn reply_error(outbox: &Outbox, message: String) {
    if outbox.send(ServerMessage::Error(ErrorMessage { message })).is_err() {
        debug!("Connection closed before the error could be reported");
    }
}
