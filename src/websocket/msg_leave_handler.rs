use tracing::debug;

use crate::models::LeaveNoteMessage;
use crate::ws::{ConnId, GatewayError, SessionGateway};

/// Handle LeaveNoteMessage
pub async fn handle_leave_message(leave_msg: &LeaveNoteMessage, conn_id: ConnId, gateway: &SessionGateway) -> Result<(), GatewayError> {
    debug!("Leave received on connection {}: note={}, participant={}", conn_id, leave_msg.note_id, leave_msg.participant);
    gateway.leave(conn_id, &leave_msg.note_id, &leave_msg.participant).await
}
