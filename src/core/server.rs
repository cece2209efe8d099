//! Server service that coordinates sessions, rooms and collaborators
//!
//! Room state is read or mutated inside the room store's lock; frames are
//! only sent after that lock has been released. A failed send is treated
//! exactly like the connection closing.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use warp::ws::Message as WsMessage;

use crate::core::connection::Connection;
use crate::core::message::{GameEvent, RoomId};
use crate::core::room::{ClosedRoom, GameSetup, ParticipantSetup, RoomManager};
use crate::core::session::SessionManager;
use crate::error::{RelayError, Result};
use crate::storage::{DeckStorage, MemoryStorage, ProfileStorage};

/// Coordinates the connection registry, the room store and the
/// profile/deck collaborators
pub struct ServerManager {
    sessions: RwLock<SessionManager>,
    rooms: RoomManager,
    profiles: Arc<dyn ProfileStorage>,
    decks: Arc<dyn DeckStorage>,
}

impl ServerManager {
    pub fn new(profiles: Arc<dyn ProfileStorage>, decks: Arc<dyn DeckStorage>) -> Self {
        Self {
            sessions: RwLock::new(SessionManager::new()),
            rooms: RoomManager::new(),
            profiles,
            decks,
        }
    }

    /// Use one in-memory store for both profiles and decks
    pub fn with_memory_storage(storage: Arc<MemoryStorage>) -> Self {
        Self::new(storage.clone(), storage)
    }

    /// Register a freshly opened connection under its display name
    pub async fn open_connection(
        &self,
        display_name: String,
        sender: mpsc::UnboundedSender<WsMessage>,
    ) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(display_name, sender));
        let mut sessions = self.sessions.write().await;
        sessions.register(connection.clone());
        log::info!(
            "Client connected: {} ({}), {} open",
            connection.name,
            connection.id,
            sessions.client_count()
        );
        connection
    }

    /// Close a connection: unregister it, delete its room and tell the
    /// opponent. Closing an unknown connection is a no-op.
    pub async fn close_connection(&self, connection_id: &str) {
        self.reap(vec![connection_id.to_string()]).await;
        log::debug!(
            "{} connection(s) and {} room(s) open",
            self.connection_count().await,
            self.room_count().await
        );
    }

    /// Handle `startGame`: seat the sender in the room and send the
    /// start-of-game payload to everyone in it. Returns frames delivered.
    pub async fn start_game(&self, connection_id: &str, room_id: &RoomId) -> Result<usize> {
        let connection = self.connection(connection_id).await?;
        if !room_id.has_participant(&connection.name) {
            return Err(RelayError::NotAParticipant {
                room_id: room_id.to_string(),
                name: connection.name.clone(),
            });
        }

        let setup = self.resolve_setup(room_id).await?;
        let frame = GameEvent::StartGame(setup.players_payload()?).render();

        let outcome = self.rooms.join(room_id, connection.clone(), setup).await?;
        log::info!(
            "{} joined room {} ({}/2)",
            connection.name,
            room_id,
            outcome.members.len()
        );

        let mut failed = Vec::new();
        if let Some(abandoned) = outcome.abandoned {
            failed.extend(self.announce_departure(&connection.name, abandoned));
        }

        let (sent, send_failures) = deliver(&outcome.members, &frame);
        failed.extend(send_failures);
        self.reap(failed).await;

        Ok(sent)
    }

    /// Handle `restartGame`: replay the captured start-of-game payload to
    /// both participants without consulting the collaborators again.
    /// A missing room is not an error.
    pub async fn restart_game(&self, connection_id: &str, room_id: &RoomId) -> Result<usize> {
        if !self.rooms.is_member(room_id.as_str(), connection_id).await {
            log::debug!(
                "Dropping restart for room {} from non-member {}",
                room_id,
                connection_id
            );
            return Ok(0);
        }

        let (setup, members) = match self.rooms.setup_snapshot(room_id.as_str()).await {
            Some(snapshot) => snapshot,
            None => return Ok(0),
        };

        let frame = GameEvent::StartGame(setup.players_payload()?).render();
        let (sent, failed) = deliver(&members, &frame);
        self.reap(failed).await;

        log::info!("Restarted game in room {}", room_id);
        Ok(sent)
    }

    /// Send an event to the sender's opponent. Returns `false` when the room
    /// or the opponent is gone, which is expected after a disconnect.
    pub async fn relay_to_opponent(
        &self,
        connection_id: &str,
        room_id: &RoomId,
        event: &GameEvent,
    ) -> bool {
        let opponent = match self.rooms.opponent_of(room_id.as_str(), connection_id).await {
            Some(opponent) => opponent,
            None => {
                let reason = if self.room_exists(room_id.as_str()).await {
                    "no opponent"
                } else {
                    "no such room"
                };
                log::debug!(
                    "Dropping {} for room {} from {}: {}",
                    event.name(),
                    room_id,
                    connection_id,
                    reason
                );
                return false;
            }
        };

        let (sent, failed) = deliver(std::slice::from_ref(&opponent), &event.render());
        self.reap(failed).await;
        sent == 1
    }

    /// Send an event straight back to one connection
    pub async fn send_to_connection(&self, connection_id: &str, event: &GameEvent) -> Result<bool> {
        let connection = self.connection(connection_id).await?;
        let (sent, failed) = deliver(std::slice::from_ref(&connection), &event.render());
        self.reap(failed).await;
        Ok(sent == 1)
    }

    /// Send `[HEARTBEAT]` to every open connection. Failed sends go down the
    /// close path.
    pub async fn send_heartbeats(&self) -> usize {
        let connections = self.sessions.read().await.connections();
        let (sent, failed) = deliver(&connections, &GameEvent::Heartbeat.render());
        if !failed.is_empty() {
            log::info!("Heartbeat failed for {} connection(s)", failed.len());
        }
        self.reap(failed).await;
        sent
    }

    /// Start the recurring liveness check
    pub fn start_heartbeat_task(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let sent = self.send_heartbeats().await;
                log::trace!("Heartbeat sent to {} connection(s)", sent);
            }
        })
    }

    pub async fn display_name(&self, connection_id: &str) -> Option<String> {
        self.sessions.read().await.display_name(connection_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.client_count()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.room_count().await
    }

    pub async fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.room_exists(room_id).await
    }

    async fn connection(&self, connection_id: &str) -> Result<Arc<Connection>> {
        self.sessions
            .read()
            .await
            .get_connection(connection_id)
            .ok_or_else(|| RelayError::SessionNotFound(connection_id.to_string()))
    }

    /// Look up deck, avatar and sleeve for both names in the room id
    async fn resolve_setup(&self, room_id: &RoomId) -> Result<GameSetup> {
        let (first, second) = room_id.participants();
        Ok(GameSetup {
            participants: [
                self.resolve_participant(first).await?,
                self.resolve_participant(second).await?,
            ],
        })
    }

    async fn resolve_participant(&self, name: &str) -> Result<ParticipantSetup> {
        let deck_id = self.profiles.active_deck(name).await?;
        self.decks.get_deck(&deck_id).await?;

        Ok(ParticipantSetup {
            name: name.to_string(),
            deck_id,
            avatar: self.profiles.avatar(name).await?,
            sleeve: self.profiles.sleeve(name).await?,
        })
    }

    /// Tell whoever is left in a deleted room that their opponent is gone
    fn announce_departure(&self, leaver: &str, closed: ClosedRoom) -> Vec<String> {
        let duration = Utc::now() - closed.created_at;
        log::info!(
            "Room {} closed after {}s: {} left",
            closed.id,
            duration.num_seconds(),
            leaver
        );
        let (_, failed) = deliver(&closed.remaining, &GameEvent::PlayerLeft.render());
        failed
    }

    /// Run the close path for every connection in the worklist. Announcing a
    /// departure can itself fail and add more work.
    async fn reap(&self, mut pending: Vec<String>) {
        while let Some(connection_id) = pending.pop() {
            let removed = self.sessions.write().await.unregister(&connection_id);
            let closed = self.rooms.remove_connection(&connection_id).await;

            let name = match &removed {
                Some(connection) => {
                    log::info!(
                        "Client disconnected: {} ({}) after {}s",
                        connection.name,
                        connection.id,
                        connection.connection_duration().as_secs()
                    );
                    connection.name.clone()
                }
                None => connection_id.clone(),
            };

            if let Some(closed) = closed {
                pending.extend(self.announce_departure(&name, closed));
            }
        }
    }
}

/// Queue a frame on each connection; returns the number delivered and the
/// ids whose writer side is gone
fn deliver(targets: &[Arc<Connection>], frame: &str) -> (usize, Vec<String>) {
    let mut sent = 0;
    let mut failed = Vec::new();
    for target in targets {
        if target.send_text(frame) {
            sent += 1;
        } else {
            failed.push(target.id.clone());
        }
    }
    (sent, failed)
}

// Shared reference to server manager
pub type SharedServerManager = Arc<ServerManager>;
