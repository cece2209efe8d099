use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::connection::Connection;
use crate::core::message::{Player, RoomId};
use crate::error::{RelayError, Result};

/// A room never holds more than two connections
pub const MAX_PARTICIPANTS: usize = 2;

/// Setup captured for one participant when the room is (re)established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSetup {
    pub name: String,
    pub deck_id: String,
    pub avatar: String,
    pub sleeve: String,
}

impl ParticipantSetup {
    pub fn player(&self) -> Player {
        Player {
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            sleeve: self.sleeve.clone(),
        }
    }
}

/// Both participants' setup, in room-id order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    pub participants: [ParticipantSetup; 2],
}

impl GameSetup {
    pub fn players(&self) -> [Player; 2] {
        [self.participants[0].player(), self.participants[1].player()]
    }

    /// JSON array of the two players carried by `[START_GAME]`
    pub fn players_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.players())?)
    }
}

/// A two-player game room
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    members: Vec<Arc<Connection>>,
    setup: Option<GameSetup>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: Vec::with_capacity(MAX_PARTICIPANTS),
            setup: None,
            created_at: Utc::now(),
        }
    }

    /// Adds a member; returns `false` if it was already present
    pub fn add_member(&mut self, connection: Arc<Connection>) -> Result<bool> {
        if self.has_member(&connection.id) {
            return Ok(false);
        }
        if self.members.len() >= MAX_PARTICIPANTS {
            return Err(RelayError::RoomFull(self.id.to_string()));
        }
        self.members.push(connection);
        Ok(true)
    }

    pub fn remove_member(&mut self, connection_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|c| c.id != connection_id);
        self.members.len() != before
    }

    pub fn has_member(&self, connection_id: &str) -> bool {
        self.members.iter().any(|c| c.id == connection_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> Vec<Arc<Connection>> {
        self.members.clone()
    }

    /// The other member of the room
    pub fn opponent_of(&self, connection_id: &str) -> Option<Arc<Connection>> {
        self.members.iter().find(|c| c.id != connection_id).cloned()
    }

    pub fn setup(&self) -> Option<&GameSetup> {
        self.setup.as_ref()
    }

    pub fn set_setup(&mut self, setup: GameSetup) {
        self.setup = Some(setup);
    }
}

/// Result of a successful join
#[derive(Debug)]
pub struct JoinOutcome {
    /// Everyone in the room after the join, the joiner included
    pub members: Vec<Arc<Connection>>,
    /// A different room the joiner was still in; it has been removed
    pub abandoned: Option<ClosedRoom>,
}

/// A room deleted because one participant left
#[derive(Debug)]
pub struct ClosedRoom {
    pub id: RoomId,
    pub remaining: Vec<Arc<Connection>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct RoomState {
    rooms: HashMap<String, Room>,
    /// connection id -> room id
    client_rooms: HashMap<String, String>,
}

impl RoomState {
    fn close_room(&mut self, room_id: &str, leaving: &str) -> Option<ClosedRoom> {
        let mut room = self.rooms.remove(room_id)?;
        room.remove_member(leaving);
        for member in &room.members {
            self.client_rooms.remove(&member.id);
        }
        Some(ClosedRoom {
            id: room.id,
            remaining: room.members,
            created_at: room.created_at,
        })
    }
}

/// Owns room membership. Every read or write goes through one lock, and
/// callers get snapshots back so sends happen after the lock is released.
pub struct RoomManager {
    state: RwLock<RoomState>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RoomState::default()),
        }
    }

    /// Adds a connection to a room, creating the room on first join, and
    /// records the setup used for the start-of-game payload.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection: Arc<Connection>,
        setup: GameSetup,
    ) -> Result<JoinOutcome> {
        let mut state = self.state.write().await;

        if let Some(room) = state.rooms.get(room_id.as_str()) {
            if !room.has_member(&connection.id) && room.member_count() >= MAX_PARTICIPANTS {
                return Err(RelayError::RoomFull(room_id.to_string()));
            }
        }

        let abandoned = match state.client_rooms.get(&connection.id).cloned() {
            Some(previous) if previous != room_id.as_str() => {
                state.close_room(&previous, &connection.id)
            }
            _ => None,
        };

        let room = state
            .rooms
            .entry(room_id.as_str().to_string())
            .or_insert_with(|| Room::new(room_id.clone()));
        room.add_member(connection.clone())?;
        room.set_setup(setup);
        let members = room.members();

        state
            .client_rooms
            .insert(connection.id.clone(), room_id.as_str().to_string());

        Ok(JoinOutcome { members, abandoned })
    }

    /// Removes a connection from its room and deletes that room
    pub async fn remove_connection(&self, connection_id: &str) -> Option<ClosedRoom> {
        let mut state = self.state.write().await;
        let room_id = state.client_rooms.remove(connection_id)?;
        state.close_room(&room_id, connection_id)
    }

    /// The sender's opponent, if the sender is in the room and not alone
    pub async fn opponent_of(&self, room_id: &str, connection_id: &str) -> Option<Arc<Connection>> {
        let state = self.state.read().await;
        let room = state.rooms.get(room_id)?;
        if !room.has_member(connection_id) {
            return None;
        }
        room.opponent_of(connection_id)
    }

    /// Captured setup and current members, for replaying the start payload
    pub async fn setup_snapshot(&self, room_id: &str) -> Option<(GameSetup, Vec<Arc<Connection>>)> {
        let state = self.state.read().await;
        let room = state.rooms.get(room_id)?;
        let setup = room.setup()?.clone();
        Some((setup, room.members()))
    }

    pub async fn room_exists(&self, room_id: &str) -> bool {
        self.state.read().await.rooms.contains_key(room_id)
    }

    pub async fn is_member(&self, room_id: &str, connection_id: &str) -> bool {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .map(|room| room.has_member(connection_id))
            .unwrap_or(false)
    }

    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
