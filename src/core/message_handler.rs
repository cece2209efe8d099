//! Command router: turns parsed frames into room effects and relayed events

use log::debug;

use crate::constants::DEFAULT_MAX_FRAME_BYTES;
use crate::core::message::{Command, GameEvent, RoomAction};
use crate::core::protocol;
use crate::core::server::SharedServerManager;
use crate::error::{RelayError, Result};

/// Memory gained by one side is lost by the other
pub fn negate_memory(value: i64) -> Option<i64> {
    value.checked_neg()
}

/// The attacking card sits on the sender's side of the board, which the
/// receiver sees as the opponent's side
pub fn flip_attacker(attacker: &str) -> String {
    match attacker.strip_prefix("my") {
        Some(slot) => format!("opponent{}", slot),
        None => attacker.to_string(),
    }
}

/// Security attacked by the sender is the receiver's own security
pub fn flip_attack_target(target: &str) -> &str {
    match target {
        "opponentSecurity" | "security" => "mySecurity",
        other => other,
    }
}

/// The event the opponent receives for a room action. `None` means the
/// action cannot be expressed from the receiver's side and is dropped.
pub fn opponent_event(action: RoomAction, sender_name: &str) -> Option<GameEvent> {
    let event = match action {
        RoomAction::Surrender => GameEvent::Surrender,
        RoomAction::RestartRequest => GameEvent::Restart,
        RoomAction::AcceptRestart => GameEvent::AcceptRestart,
        RoomAction::OpenedSecurity => GameEvent::SecurityViewed,
        RoomAction::Sfx(sfx) => GameEvent::Sfx(sfx),
        RoomAction::Chat { text } => GameEvent::ChatMessage {
            sender: sender_name.to_string(),
            text,
        },
        RoomAction::UpdateGame { payload } => GameEvent::UpdateOpponent(payload),
        RoomAction::MoveCard { card_id, from, to } => GameEvent::MoveCard { card_id, from, to },
        RoomAction::UpdateMemory { value } => GameEvent::UpdateMemory(negate_memory(value)?),
        RoomAction::Attack { attacker, target } => GameEvent::Attack {
            attacker: flip_attacker(&attacker),
            target: flip_attack_target(&target).to_string(),
        },
    };
    Some(event)
}

/// Handles incoming client frames and routes them appropriately
pub struct MessageHandler {
    server: SharedServerManager,
    max_frame_bytes: usize,
}

impl MessageHandler {
    pub fn new(server: SharedServerManager) -> Self {
        Self::with_max_frame_bytes(server, DEFAULT_MAX_FRAME_BYTES)
    }

    pub fn with_max_frame_bytes(server: SharedServerManager, max_frame_bytes: usize) -> Self {
        Self {
            server,
            max_frame_bytes,
        }
    }

    /// Process one text frame from a connection. Errors are for logging
    /// only; nothing is ever sent back to the client for them.
    pub async fn handle_client_message(&self, connection_id: &str, frame: &str) -> Result<()> {
        if frame.len() > self.max_frame_bytes {
            return Err(RelayError::MessageTooLarge(frame.len()));
        }

        let command = protocol::parse(frame)?;
        self.dispatch(connection_id, command).await
    }

    /// Execute an already parsed command on behalf of a connection
    pub async fn dispatch(&self, connection_id: &str, command: Command) -> Result<()> {
        match command {
            Command::Heartbeat => {
                self.server
                    .send_to_connection(connection_id, &GameEvent::Heartbeat)
                    .await?;
            }
            Command::StartGame { room_id } => {
                let sent = self.server.start_game(connection_id, &room_id).await?;
                debug!("Start of game for {} sent to {} connection(s)", room_id, sent);
            }
            Command::RestartGame { room_id } => {
                self.server.restart_game(connection_id, &room_id).await?;
            }
            Command::Room { room_id, action } => {
                let sender = match self.server.display_name(connection_id).await {
                    Some(name) => name,
                    None => return Err(RelayError::SessionNotFound(connection_id.to_string())),
                };

                let event = match opponent_event(action, &sender) {
                    Some(event) => event,
                    None => {
                        return Err(RelayError::MessageParseError(
                            "Memory value out of range".to_string(),
                        ))
                    }
                };

                if self
                    .server
                    .relay_to_opponent(connection_id, &room_id, &event)
                    .await
                {
                    debug!("Relayed {} in room {} from {}", event.name(), room_id, sender);
                }
            }
        }
        Ok(())
    }
}
