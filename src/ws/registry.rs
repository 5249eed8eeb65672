use std::collections::{HashMap, HashSet};

/// Participants currently present in each note room.
///
/// Rooms are created lazily on the first join and dropped as soon as the last
/// participant leaves, so the registry never holds empty rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant to the room of a note.
    ///
    /// Returns `true` if the participant was not in the room yet.
    pub fn join(&mut self, note_id: &str, participant: &str) -> bool {
        self.rooms
            .entry(note_id.to_string())
            .or_default()
            .insert(participant.to_string())
    }

    /// Remove a participant from the room of a note.
    ///
    /// Returns `true` if this emptied the room and it was removed.
    pub fn leave(&mut self, note_id: &str, participant: &str) -> bool {
        let Some(members) = self.rooms.get_mut(note_id) else {
            return false;
        };
        members.remove(participant);
        if members.is_empty() {
            self.rooms.remove(note_id);
            return true;
        }
        false
    }

    /// Current participants of a note, sorted. Empty for unknown notes.
    pub fn members_of(&self, note_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .rooms
            .get(note_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.rooms.values().map(HashSet::len).sum()
    }
}
