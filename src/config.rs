//! Server configuration module
//! Handles runtime configuration parameters for the relay

use crate::constants::{
    DEFAULT_HEARTBEAT_SECS, DEFAULT_HOST, DEFAULT_IDENTITY_HEADER, DEFAULT_MAX_FRAME_BYTES,
    DEFAULT_PORT,
};
use crate::error::{RelayError, Result};
use std::env;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How often every open connection receives `[HEARTBEAT]`
    pub heartbeat_interval: Duration,
    /// Header carrying the display name set by the authenticating proxy
    pub identity_header: String,
    /// Optional JSON file with profiles and decks to preload
    pub fixtures_path: Option<String>,
    /// Serve a guest profile for names without a stored profile
    pub guest_profiles: bool,
    /// Inbound frames larger than this are dropped
    pub max_frame_bytes: usize,
}

impl ServerConfig {
    /// Configuration with defaults and no environment lookups
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            fixtures_path: None,
            guest_profiles: true,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("GAME_RELAY_HOST").unwrap_or(DEFAULT_HOST.to_string());

        let port = match env::var("GAME_RELAY_PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| RelayError::ConfigError(format!("Invalid port: {}", p)))?,
            Err(_) => DEFAULT_PORT,
        };

        let heartbeat_secs: u64 = match env::var("GAME_RELAY_HEARTBEAT_SECS") {
            Ok(s) => s.parse().map_err(|_| {
                RelayError::ConfigError(format!("Invalid heartbeat interval: {}", s))
            })?,
            Err(_) => DEFAULT_HEARTBEAT_SECS,
        };

        if heartbeat_secs == 0 {
            return Err(RelayError::ConfigError(
                "GAME_RELAY_HEARTBEAT_SECS must be greater than zero".to_string(),
            ));
        }

        let identity_header = env::var("GAME_RELAY_IDENTITY_HEADER")
            .map(|h| h.to_lowercase())
            .unwrap_or(DEFAULT_IDENTITY_HEADER.to_string());

        let fixtures_path = env::var("GAME_RELAY_FIXTURES").ok();
        if let Some(ref path) = fixtures_path {
            if !std::path::Path::new(path).exists() {
                return Err(RelayError::ConfigError(format!(
                    "Fixtures file does not exist: {}",
                    path
                )));
            }
        }

        let guest_profiles = env::var("GAME_RELAY_GUEST_PROFILES")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let max_frame_bytes: usize = match env::var("GAME_RELAY_MAX_FRAME_BYTES") {
            Ok(b) => b
                .parse()
                .map_err(|_| RelayError::ConfigError(format!("Invalid max frame size: {}", b)))?,
            Err(_) => DEFAULT_MAX_FRAME_BYTES,
        };

        if max_frame_bytes == 0 {
            return Err(RelayError::ConfigError(
                "GAME_RELAY_MAX_FRAME_BYTES must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            identity_header,
            fixtures_path,
            guest_profiles,
            max_frame_bytes,
        })
    }
}
