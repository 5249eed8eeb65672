use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use super::registry::RoomRegistry;
use super::relay;
use crate::models::ServerMessage;

pub type ConnId = Uuid;

/// Outbound queue of a single connection.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Malformed payload: missing {0}")]
    MalformedPayload(&'static str),

    #[error("Connection is already joined to note '{note_id}' as '{participant}', leave it first")]
    AlreadyJoined { note_id: String, participant: String },

    #[error("Connection is not joined to note '{0}'")]
    NotJoined(String),

    #[error("Unknown connection {0}")]
    UnknownConnection(ConnId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedNote {
    pub note_id: String,
    pub participant: String,
}

#[derive(Debug)]
pub(crate) struct Session {
    pub outbox: Outbox,
    pub joined: Option<JoinedNote>,
}

/// Everything the gateway mutates, kept behind a single lock so a membership
/// change and the broadcast it triggers are never interleaved with other events.
#[derive(Debug, Default)]
pub(crate) struct GatewayState {
    pub registry: RoomRegistry,
    pub sessions: HashMap<ConnId, Session>,
    /// Connections joined to each note.
    pub subs: HashMap<String, HashSet<ConnId>>,
}

impl GatewayState {
    pub(crate) fn subscribers<'a>(&'a self, note_id: &str) -> impl Iterator<Item = ConnId> + 'a {
        self.subs
            .get(note_id)
            .into_iter()
            .flat_map(|conns| conns.iter().copied())
    }

    /// Drop a connection from its note and remove the participant from the
    /// room unless another connection still holds the same identity there.
    fn detach(&mut self, conn_id: ConnId, joined: &JoinedNote) {
        if let Some(conns) = self.subs.get_mut(&joined.note_id) {
            conns.remove(&conn_id);
            if conns.is_empty() {
                self.subs.remove(&joined.note_id);
            }
        }

        let still_present = self.subscribers(&joined.note_id).any(|other| {
            self.sessions
                .get(&other)
                .and_then(|session| session.joined.as_ref())
                .is_some_and(|theirs| theirs.participant == joined.participant)
        });
        if still_present {
            debug!(
                "Participant {} still connected to note {} from another connection",
                joined.participant, joined.note_id
            );
            return;
        }

        if self.registry.leave(&joined.note_id, &joined.participant) {
            info!("Room for note {} closed", joined.note_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayStats {
    pub connections: usize,
    pub joined: usize,
    pub rooms: usize,
    pub participants: usize,
}

/// Bridges live transport connections to the room registry.
#[derive(Debug, Default)]
pub struct SessionGateway {
    state: Mutex<GatewayState>,
}

fn require(value: &str, field: &'static str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::MalformedPayload(field));
    }
    Ok(())
}

impl SessionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. Events for it are pushed onto `outbox`.
    pub async fn connect(&self, outbox: Outbox) -> ConnId {
        let conn_id = Uuid::new_v4();
        let mut state = self.state.lock().await;
        state.sessions.insert(conn_id, Session { outbox, joined: None });
        debug!("Connection {} registered ({} open)", conn_id, state.sessions.len());
        conn_id
    }

    /// Join a connection to a note room and broadcast the new member list.
    ///
    /// Re-joining the same note as the same participant changes nothing but
    /// still re-broadcasts. A connection joined anywhere else must leave first.
    pub async fn join(&self, conn_id: ConnId, note_id: &str, participant: &str) -> Result<(), GatewayError> {
        require(note_id, "noteId")?;
        require(participant, "participant")?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let session = state
            .sessions
            .get_mut(&conn_id)
            .ok_or(GatewayError::UnknownConnection(conn_id))?;

        if let Some(joined) = &session.joined {
            if joined.note_id != note_id || joined.participant != participant {
                return Err(GatewayError::AlreadyJoined {
                    note_id: joined.note_id.clone(),
                    participant: joined.participant.clone(),
                });
            }
            debug!("{} re-joined note {} on connection {}", participant, note_id, conn_id);
        } else {
            session.joined = Some(JoinedNote {
                note_id: note_id.to_string(),
                participant: participant.to_string(),
            });
            state.subs.entry(note_id.to_string()).or_default().insert(conn_id);
            state.registry.join(note_id, participant);
            info!("{} joined note {} on connection {}", participant, note_id, conn_id);
        }

        relay::broadcast_membership(state, note_id);
        Ok(())
    }

    /// Leave the note a connection is joined to.
    ///
    /// The remaining members get the new list, and so does the leaving
    /// connection since it is still open.
    pub async fn leave(&self, conn_id: ConnId, note_id: &str, participant: &str) -> Result<(), GatewayError> {
        require(note_id, "noteId")?;
        require(participant, "participant")?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let session = state
            .sessions
            .get_mut(&conn_id)
            .ok_or(GatewayError::UnknownConnection(conn_id))?;

        let joined = match session.joined.take() {
            Some(joined) if joined.note_id == note_id && joined.participant == participant => joined,
            other => {
                session.joined = other;
                return Err(GatewayError::NotJoined(note_id.to_string()));
            }
        };

        state.detach(conn_id, &joined);
        relay::broadcast_membership(state, note_id);
        relay::deliver(state, conn_id, relay::membership_update(state, note_id));
        info!("{} left note {} on connection {}", participant, note_id, conn_id);
        Ok(())
    }

    /// Relay new content from a joined connection to the rest of its room.
    pub async fn edit(&self, conn_id: ConnId, note_id: &str, content: &str) -> Result<(), GatewayError> {
        require(note_id, "noteId")?;

        let state = self.state.lock().await;
        let session = state
            .sessions
            .get(&conn_id)
            .ok_or(GatewayError::UnknownConnection(conn_id))?;
        if !session.joined.as_ref().is_some_and(|joined| joined.note_id == note_id) {
            return Err(GatewayError::NotJoined(note_id.to_string()));
        }

        relay::relay_edit(&state, note_id, conn_id, content);
        Ok(())
    }

    /// Forget a connection, leaving its note if it was joined. Unknown ids are ignored.
    pub async fn disconnect(&self, conn_id: ConnId) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(session) = state.sessions.remove(&conn_id) else {
            debug!("Connection {} already gone", conn_id);
            return;
        };

        if let Some(joined) = session.joined {
            state.detach(conn_id, &joined);
            relay::broadcast_membership(state, &joined.note_id);
            info!(
                "{} dropped from note {} after connection {} closed",
                joined.participant, joined.note_id, conn_id
            );
        }
    }

    pub async fn members_of(&self, note_id: &str) -> Vec<String> {
        self.state.lock().await.registry.members_of(note_id)
    }

    pub async fn stats(&self) -> GatewayStats {
        let state = self.state.lock().await;
        GatewayStats {
            connections: state.sessions.len(),
            joined: state.sessions.values().filter(|s| s.joined.is_some()).count(),
            rooms: state.registry.room_count(),
            participants: state.registry.participant_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteUpdatedMessage, UserListMessage};
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn open(gateway: &SessionGateway) -> (ConnId, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (gateway.connect(tx).await, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn members(note_id: &str, participants: &[&str]) -> ServerMessage {
        ServerMessage::UserListUpdate(UserListMessage {
            note_id: note_id.to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
        })
    }

    fn updated(note_id: &str, content: &str) -> ServerMessage {
        ServerMessage::NoteUpdated(NoteUpdatedMessage {
            note_id: note_id.to_string(),
            content: content.to_string(),
        })
    }

    #[tokio::test]
    async fn join_broadcasts_members_to_everyone_in_room() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        let (b, mut rx_b) = open(&gateway).await;

        gateway.join(a, "N1", "alice").await.unwrap();
        assert_eq!(drain(&mut rx_a), vec![members("N1", &["alice"])]);

        gateway.join(b, "N1", "bob").await.unwrap();
        assert_eq!(drain(&mut rx_a), vec![members("N1", &["alice", "bob"])]);
        assert_eq!(drain(&mut rx_b), vec![members("N1", &["alice", "bob"])]);
    }

    #[tokio::test]
    async fn edit_reaches_others_but_not_sender() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        let (b, mut rx_b) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(b, "N1", "bob").await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        gateway.edit(a, "N1", "X").await.unwrap();

        assert_eq!(drain(&mut rx_b), vec![updated("N1", "X")]);
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn racing_edits_arrive_in_send_order_without_merge() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        let (b, mut rx_b) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(b, "N1", "bob").await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        gateway.edit(a, "N1", "X").await.unwrap();
        gateway.edit(b, "N1", "Y").await.unwrap();
        gateway.edit(a, "N1", "XZ").await.unwrap();

        assert_eq!(drain(&mut rx_b), vec![updated("N1", "X"), updated("N1", "XZ")]);
        assert_eq!(drain(&mut rx_a), vec![updated("N1", "Y")]);
    }

    #[tokio::test]
    async fn edits_stay_inside_their_room() {
        let gateway = SessionGateway::new();
        let (a, _rx_a) = open(&gateway).await;
        let (c, mut rx_c) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(c, "N2", "carol").await.unwrap();
        drain(&mut rx_c);

        gateway.edit(a, "N1", "X").await.unwrap();
        assert!(drain(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn disconnect_without_leave_removes_room() {
        let gateway = SessionGateway::new();
        let (a, _rx_a) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();

        gateway.disconnect(a).await;

        assert!(gateway.members_of("N1").await.is_empty());
        let stats = gateway.stats().await;
        assert_eq!(stats.rooms, 0);
        assert_eq!(stats.connections, 0);
    }

    #[tokio::test]
    async fn disconnect_notifies_remaining_members() {
        let gateway = SessionGateway::new();
        let (a, _rx_a) = open(&gateway).await;
        let (b, mut rx_b) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(b, "N1", "bob").await.unwrap();
        drain(&mut rx_b);

        gateway.disconnect(a).await;

        assert_eq!(drain(&mut rx_b), vec![members("N1", &["bob"])]);
        assert_eq!(gateway.members_of("N1").await, vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn explicit_leave_updates_leaver_and_room() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        let (b, mut rx_b) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(b, "N1", "bob").await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        gateway.leave(a, "N1", "alice").await.unwrap();

        assert_eq!(drain(&mut rx_a), vec![members("N1", &["bob"])]);
        assert_eq!(drain(&mut rx_b), vec![members("N1", &["bob"])]);

        // a is back to unjoined and no longer receives edits
        gateway.edit(b, "N1", "Y").await.unwrap();
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(gateway.edit(a, "N1", "X").await, Err(GatewayError::NotJoined("N1".to_string())));
    }

    #[tokio::test]
    async fn rejoin_is_idempotent_but_rebroadcasts() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(a, "N1", "alice").await.unwrap();

        assert_eq!(
            drain(&mut rx_a),
            vec![members("N1", &["alice"]), members("N1", &["alice"])]
        );
        assert_eq!(gateway.stats().await.participants, 1);
    }

    #[tokio::test]
    async fn second_note_requires_leaving_first() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        drain(&mut rx_a);

        let err = gateway.join(a, "N2", "alice").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::AlreadyJoined {
                note_id: "N1".to_string(),
                participant: "alice".to_string(),
            }
        );
        assert!(drain(&mut rx_a).is_empty());
        assert!(gateway.members_of("N2").await.is_empty());

        gateway.leave(a, "N1", "alice").await.unwrap();
        gateway.join(a, "N2", "alice").await.unwrap();
        assert!(gateway.members_of("N1").await.is_empty());
        assert_eq!(gateway.members_of("N2").await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn shared_identity_stays_until_last_connection_leaves() {
        let gateway = SessionGateway::new();
        let (tab1, _rx1) = open(&gateway).await;
        let (tab2, _rx2) = open(&gateway).await;
        gateway.join(tab1, "N1", "alice").await.unwrap();
        gateway.join(tab2, "N1", "alice").await.unwrap();

        gateway.leave(tab1, "N1", "alice").await.unwrap();
        assert_eq!(gateway.members_of("N1").await, vec!["alice".to_string()]);

        gateway.disconnect(tab2).await;
        assert!(gateway.members_of("N1").await.is_empty());
        assert_eq!(gateway.stats().await.rooms, 0);
    }

    #[tokio::test]
    async fn malformed_and_mismatched_requests_are_rejected() {
        let gateway = SessionGateway::new();
        let (a, mut rx_a) = open(&gateway).await;

        assert_eq!(gateway.join(a, "", "alice").await, Err(GatewayError::MalformedPayload("noteId")));
        assert_eq!(gateway.join(a, "N1", "  ").await, Err(GatewayError::MalformedPayload("participant")));
        assert_eq!(gateway.edit(a, "N1", "X").await, Err(GatewayError::NotJoined("N1".to_string())));
        assert_eq!(gateway.leave(a, "N1", "alice").await, Err(GatewayError::NotJoined("N1".to_string())));
        assert!(drain(&mut rx_a).is_empty());

        gateway.join(a, "N1", "alice").await.unwrap();
        assert_eq!(gateway.leave(a, "N1", "bob").await, Err(GatewayError::NotJoined("N1".to_string())));
        assert_eq!(gateway.members_of("N1").await, vec!["alice".to_string()]);

        let ghost = Uuid::new_v4();
        assert_eq!(gateway.join(ghost, "N1", "bob").await, Err(GatewayError::UnknownConnection(ghost)));
    }

    #[tokio::test]
    async fn closed_outbox_does_not_block_relay() {
        let gateway = SessionGateway::new();
        let (a, _rx_a) = open(&gateway).await;
        let (b, rx_b) = open(&gateway).await;
        let (c, mut rx_c) = open(&gateway).await;
        gateway.join(a, "N1", "alice").await.unwrap();
        gateway.join(b, "N1", "bob").await.unwrap();
        gateway.join(c, "N1", "carol").await.unwrap();
        drain(&mut rx_c);
        drop(rx_b);

        gateway.edit(a, "N1", "X").await.unwrap();
        assert_eq!(drain(&mut rx_c), vec![updated("N1", "X")]);
    }
}
