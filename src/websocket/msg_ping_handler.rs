use chrono::Utc;
use tracing::{debug, error};

use crate::models::{PingMessage, PongMessage, ServerMessage};
use crate::ws::{ConnId, Outbox};

/// Handle PingMessage
pub fn handle_ping_message(_ping_msg: &PingMessage, conn_id: ConnId, outbox: &Outbox) {
    debug!("Ping received on connection {}", conn_id);

    let pong = ServerMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() });
    if outbox.send(pong).is_err() {
        error!("Failed to send Pong message on connection {}", conn_id);
    }
}
