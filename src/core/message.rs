//! Protocol value types shared by the codec, the router and the room store

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ARG_DELIMITER, ROOM_SEPARATOR, VERB_PREFIX};
use crate::error::{RelayError, Result};

/// Identifier of a two-player room: `<nameA>‗<nameB>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId {
    raw: String,
    split: usize,
}

impl RoomId {
    /// Build a room id from the two participant names, in that order
    pub fn new(first: &str, second: &str) -> Result<Self> {
        Self::parse(&format!("{}{}{}", first, ROOM_SEPARATOR, second))
    }

    /// Parse `<nameA>‗<nameB>`, rejecting anything that is not exactly two names
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(ROOM_SEPARATOR);
        let (first, second) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => (a, b),
            _ => {
                return Err(RelayError::MessageParseError(format!(
                    "Room id must join exactly two names with '{}': {}",
                    ROOM_SEPARATOR, raw
                )))
            }
        };

        if first.is_empty() || second.is_empty() {
            return Err(RelayError::MessageParseError(format!(
                "Room id contains an empty name: {}",
                raw
            )));
        }
        if first == second {
            return Err(RelayError::MessageParseError(format!(
                "Room id names the same player twice: {}",
                raw
            )));
        }
        if raw.contains(ARG_DELIMITER) || raw.contains(VERB_PREFIX) {
            return Err(RelayError::MessageParseError(format!(
                "Room id contains a reserved delimiter: {}",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            split: first.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The two participant names in room-id order
    pub fn participants(&self) -> (&str, &str) {
        let first = &self.raw[..self.split];
        let second = &self.raw[self.split + ROOM_SEPARATOR.len_utf8()..];
        (first, second)
    }

    pub fn has_participant(&self, name: &str) -> bool {
        let (first, second) = self.participants();
        first == name || second == name
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Public face of a participant sent in the start-of-game payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub avatar: String,
    pub sleeve: String,
}

/// Sound cues mirrored to the opponent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Reveal,
    SecurityReveal,
    PlaceCard,
    DrawCard,
    SuspendCard,
    UnsuspendCard,
    ButtonClick,
    TrashCard,
    ShuffleDeck,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 9] = [
        SoundEffect::Reveal,
        SoundEffect::SecurityReveal,
        SoundEffect::PlaceCard,
        SoundEffect::DrawCard,
        SoundEffect::SuspendCard,
        SoundEffect::UnsuspendCard,
        SoundEffect::ButtonClick,
        SoundEffect::TrashCard,
        SoundEffect::ShuffleDeck,
    ];

    pub fn from_verb(verb: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|sfx| sfx.verb() == verb)
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Reveal => "playRevealSfx",
            Self::SecurityReveal => "playSecurityRevealSfx",
            Self::PlaceCard => "playPlaceCardSfx",
            Self::DrawCard => "playDrawCardSfx",
            Self::SuspendCard => "playSuspendCardSfx",
            Self::UnsuspendCard => "playUnsuspendCardSfx",
            Self::ButtonClick => "playButtonClickSfx",
            Self::TrashCard => "playTrashCardSfx",
            Self::ShuffleDeck => "playShuffleDeckSfx",
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Reveal => "REVEAL_SFX",
            Self::SecurityReveal => "SECURITY_REVEAL_SFX",
            Self::PlaceCard => "PLACE_CARD_SFX",
            Self::DrawCard => "DRAW_CARD_SFX",
            Self::SuspendCard => "SUSPEND_CARD_SFX",
            Self::UnsuspendCard => "UNSUSPEND_CARD_SFX",
            Self::ButtonClick => "BUTTON_CLICK_SFX",
            Self::TrashCard => "TRASH_CARD_SFX",
            Self::ShuffleDeck => "SHUFFLE_DECK_SFX",
        }
    }
}

/// A room-scoped action relayed to the opponent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    Surrender,
    RestartRequest,
    AcceptRestart,
    OpenedSecurity,
    Sfx(SoundEffect),
    Chat { text: String },
    UpdateGame { payload: String },
    MoveCard { card_id: String, from: String, to: String },
    UpdateMemory { value: i64 },
    Attack { attacker: String, target: String },
}

/// One parsed inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connection-scoped liveness reply
    Heartbeat,
    StartGame { room_id: RoomId },
    RestartGame { room_id: RoomId },
    Room { room_id: RoomId, action: RoomAction },
}

/// Outbound event rendered as `[EVENT_NAME]:arg...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Serialized pair of players
    StartGame(String),
    PlayerLeft,
    Heartbeat,
    Surrender,
    Restart,
    AcceptRestart,
    SecurityViewed,
    Sfx(SoundEffect),
    ChatMessage { sender: String, text: String },
    UpdateOpponent(String),
    MoveCard { card_id: String, from: String, to: String },
    UpdateMemory(i64),
    Attack { attacker: String, target: String },
}
