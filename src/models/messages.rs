use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinNoteMessage {
    pub note_id: String,
    pub participant: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveNoteMessage {
    pub note_id: String,
    pub participant: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditNoteMessage {
    pub note_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PingMessage {}

/// Current members of a note room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserListMessage {
    pub note_id: String,
    pub participants: Vec<String>,
}

/// Latest content of a note, relayed verbatim from another participant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdatedMessage {
    pub note_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message: String,
}

/// Events a client sends over the websocket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "joinNote")]
    JoinNote(JoinNoteMessage),
    #[serde(rename = "leaveNote")]
    LeaveNote(LeaveNoteMessage),
    #[serde(rename = "editNote")]
    EditNote(EditNoteMessage),
    #[serde(rename = "ping")]
    Ping(PingMessage),
}

/// Events the server pushes to a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "userListUpdate")]
    UserListUpdate(UserListMessage),
    #[serde(rename = "noteUpdated")]
    NoteUpdated(NoteUpdatedMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_note() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"joinNote","noteId":"n1","participant":"alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinNote(JoinNoteMessage {
                note_id: "n1".to_string(),
                participant: "alice".to_string(),
            })
        );
    }

    #[test]
    fn parses_ping_without_fields() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping(PingMessage {}));
    }

    #[test]
    fn rejects_edit_without_note_id() {
        let res = serde_json::from_str::<ClientMessage>(r#"{"type":"editNote","content":"x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_unknown_event() {
        let res = serde_json::from_str::<ClientMessage>(r#"{"type":"deleteNote","noteId":"n1"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn server_events_use_wire_names() {
        let update = ServerMessage::UserListUpdate(UserListMessage {
            note_id: "n1".to_string(),
            participants: vec!["alice".to_string(), "bob".to_string()],
        });
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"type": "userListUpdate", "noteId": "n1", "participants": ["alice", "bob"]})
        );

        let edit = ServerMessage::NoteUpdated(NoteUpdatedMessage {
            note_id: "n1".to_string(),
            content: "# Title".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&edit).unwrap(),
            json!({"type": "noteUpdated", "noteId": "n1", "content": "# Title"})
        );
    }
}
