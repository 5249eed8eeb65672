use tracing::debug;

use crate::models::JoinNoteMessage;
use crate::ws::{ConnId, GatewayError, SessionGateway};

/// Handle JoinNoteMessage
pub async fn handle_join_message(join_msg: &JoinNoteMessage, conn_id: ConnId, gateway: &SessionGateway) -> Result<(), GatewayError> {
    debug!("Join received on connection {}: note={}, participant={}", conn_id, join_msg.note_id, join_msg.participant);
    gateway.join(conn_id, &join_msg.note_id, &join_msg.participant).await
}
