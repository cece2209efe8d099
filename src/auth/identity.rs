//! Display name resolution for incoming connections
//!
//! Authentication happens upstream; the relay trusts a header set by the
//! authenticating proxy and only checks that the name is usable as half of
//! a room id.

use warp::http::HeaderMap;

use crate::constants::{
    ARG_DELIMITER, CHAT_SEPARATOR, DEFAULT_IDENTITY_HEADER, MAX_NAME_LENGTH, MIN_NAME_LENGTH,
    ROOM_SEPARATOR, VERB_PREFIX,
};
use crate::error::{RelayError, Result};

/// Resolves the display name of a connection from its handshake
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<String>;
}

/// Reads the display name from a single request header
#[derive(Debug, Clone)]
pub struct HeaderIdentityResolver {
    header: String,
}

impl HeaderIdentityResolver {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_lowercase(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl Default for HeaderIdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_HEADER)
    }
}

impl IdentityResolver for HeaderIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<String> {
        let value = headers
            .get(self.header.as_str())
            .ok_or_else(|| RelayError::InvalidIdentity(format!("Missing {} header", self.header)))?;

        let name = value
            .to_str()
            .map_err(|_| RelayError::InvalidIdentity("Header is not valid text".to_string()))?
            .trim();

        validate_display_name(name)?;
        Ok(name.to_string())
    }
}

/// Names are 3 to 16 characters and never contain protocol delimiters
pub fn validate_display_name(name: &str) -> Result<()> {
    let length = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(RelayError::InvalidIdentity(format!(
            "Name must contain between {} and {} characters",
            MIN_NAME_LENGTH, MAX_NAME_LENGTH
        )));
    }

    let reserved = [ROOM_SEPARATOR, ARG_DELIMITER, VERB_PREFIX, CHAT_SEPARATOR];
    if let Some(c) = name.chars().find(|c| reserved.contains(c) || c.is_control()) {
        return Err(RelayError::InvalidIdentity(format!(
            "Name contains reserved character {:?}",
            c
        )));
    }

    Ok(())
}
