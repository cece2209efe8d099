use std::collections::HashMap;
use std::sync::Arc;

use crate::core::connection::Connection;

// Registry of every open connection and the display name bound to it
pub struct SessionManager {
    connections: HashMap<String, Arc<Connection>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    // Register a new client connection
    pub fn register(&mut self, connection: Arc<Connection>) {
        self.connections.insert(connection.id.clone(), connection);
    }

    // Remove a client connection, returning it if it was registered
    pub fn unregister(&mut self, id: &str) -> Option<Arc<Connection>> {
        self.connections.remove(id)
    }

    pub fn get_connection(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).cloned()
    }

    pub fn display_name(&self, id: &str) -> Option<String> {
        self.connections.get(id).map(|conn| conn.name.clone())
    }

    // Snapshot of all open connections, used for heartbeat fan-out
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.connections.values().cloned().collect()
    }

    // Get current clients count
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
