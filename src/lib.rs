//! Game Relay - a two-player WebSocket relay for card game sessions
//!
//! Pairs two players into a room, seats them with their profile data and
//! relays a small text command protocol between them so both boards stay
//! in sync.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
