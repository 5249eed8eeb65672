use tracing::debug;

use crate::models::EditNoteMessage;
use crate::ws::{ConnId, GatewayError, SessionGateway};

/// Handle EditNoteMessage
///
/// Only relays the content. Persisting it is the client's separate call to the notes API.
pub async fn handle_edit_message(edit_msg: &EditNoteMessage, conn_id: ConnId, gateway: &SessionGateway) -> Result<(), GatewayError> {
    debug!("Edit received on connection {}: note={}, {} bytes", conn_id, edit_msg.note_id, edit_msg.content.len());
    gateway.edit(conn_id, &edit_msg.note_id, &edit_msg.content).await
}
