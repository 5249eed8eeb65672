use tracing::{debug, warn};

use super::gateway::{ConnId, GatewayState};
use crate::models::{NoteUpdatedMessage, ServerMessage, UserListMessage};

/// Build the membership event for a note from the registry.
pub(crate) fn membership_update(state: &GatewayState, note_id: &str) -> ServerMessage {
    ServerMessage::UserListUpdate(UserListMessage {
        note_id: note_id.to_string(),
        participants: state.registry.members_of(note_id),
    })
}

/// Send the current member list of a note to every connection joined to it,
/// the one that triggered the change included.
pub(crate) fn broadcast_membership(state: &GatewayState, note_id: &str) -> usize {
    let update = membership_update(state, note_id);
    let delivered = state
        .subscribers(note_id)
        .filter(|conn_id| deliver(state, *conn_id, update.clone()))
        .count();
    debug!("Membership of note {} sent to {} connections", note_id, delivered);
    delivered
}

/// Fan out new content to every connection joined to the note except the sender.
///
/// Content goes out verbatim. Each recipient queue is FIFO, so edits from one
/// sender arrive in the order they were relayed; nothing orders edits across senders.
pub(crate) fn relay_edit(state: &GatewayState, note_id: &str, sender: ConnId, content: &str) -> usize {
    let update = ServerMessage::NoteUpdated(NoteUpdatedMessage {
        note_id: note_id.to_string(),
        content: content.to_string(),
    });
    let delivered = state
        .subscribers(note_id)
        .filter(|conn_id| *conn_id != sender)
        .filter(|conn_id| deliver(state, *conn_id, update.clone()))
        .count();
    debug!("Edit of note {} from {} relayed to {} connections", note_id, sender, delivered);
    delivered
}

/// Enqueue a message for one connection. Failures are logged and dropped.
pub(crate) fn deliver(state: &GatewayState, conn_id: ConnId, msg: ServerMessage) -> bool {
    let Some(session) = state.sessions.get(&conn_id) else {
        warn!("Dropping message for unknown connection {}", conn_id);
        return false;
    };
    if session.outbox.send(msg).is_err() {
        warn!("Dropping message for closed connection {}", conn_id);
        return false;
    }
    true
}
