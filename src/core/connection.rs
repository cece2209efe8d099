//! WebSocket connection handle
//! Wraps the channel feeding a client's writer task

use log::warn;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::Message;

/// One open client connection bound to a display name for its lifetime
#[derive(Debug)]
pub struct Connection {
    pub id: String,
    pub name: String,
    sender: mpsc::UnboundedSender<Message>,
    pub connected_at: Instant,
}

impl Connection {
    /// Create a new connection with a unique ID
    pub fn new(name: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Queue a text frame; `false` means the writer side is gone
    pub fn send_text(&self, text: &str) -> bool {
        match self.sender.send(Message::text(text)) {
            Ok(_) => true,
            Err(_) => {
                warn!("Failed to send frame to {} ({})", self.name, self.id);
                false
            }
        }
    }

    /// Calculate the connection duration
    pub fn connection_duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
