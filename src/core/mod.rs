//! Core functionality for the game relay

pub mod connection;
pub mod message;
pub mod message_handler;
pub mod protocol;
pub mod room;
pub mod server;
pub mod session;

// Re-export main components for convenience
pub use connection::Connection;
pub use message::{Command, GameEvent, Player, RoomAction, RoomId, SoundEffect};
pub use message_handler::MessageHandler;
pub use room::{GameSetup, ParticipantSetup, Room, RoomManager};
pub use server::{ServerManager, SharedServerManager};
pub use session::SessionManager;
