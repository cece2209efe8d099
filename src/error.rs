use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    // Session errors
    SessionNotFound(String),
    InvalidIdentity(String),

    // Protocol errors
    MessageParseError(String),
    UnknownCommand(String),
    MessageTooLarge(usize),

    // Room errors
    RoomFull(String),
    NotAParticipant { room_id: String, name: String },

    // Collaborator errors
    ProfileNotFound(String),
    DeckNotFound(String),
    StorageError(String),
    SerializationError(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::InvalidIdentity(msg) => write!(f, "Invalid identity: {}", msg),
            Self::MessageParseError(msg) => write!(f, "Message parse error: {}", msg),
            Self::UnknownCommand(verb) => write!(f, "Unknown command: {}", verb),
            Self::MessageTooLarge(size) => write!(f, "Message too large: {} bytes", size),
            Self::RoomFull(id) => write!(f, "Room is full: {}", id),
            Self::NotAParticipant { room_id, name } => {
                write!(f, "{} is not a participant of room {}", name, room_id)
            }
            Self::ProfileNotFound(name) => write!(f, "Profile not found: {}", name),
            Self::DeckNotFound(id) => write!(f, "Deck not found: {}", id),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RelayError {}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::StorageError(err.to_string())
    }
}

impl RelayError {
    /// Protocol errors are expected noise from clients and are only logged.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MessageParseError(_) | Self::UnknownCommand(_) | Self::MessageTooLarge(_)
        )
    }
}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, RelayError>;
