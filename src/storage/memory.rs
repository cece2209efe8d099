//! In-memory storage implementation for development and testing
//!
//! Keeps profiles and decks in memory. Can be seeded from a JSON fixtures
//! file and can fall back to a guest profile for unknown players.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

use super::traits::*;
use crate::error::{RelayError, Result};

pub const GUEST_DECK_ID: &str = "starter";
pub const GUEST_AVATAR: &str = "default";
pub const GUEST_SLEEVE: &str = "default";

/// Shape of a fixtures file
#[derive(Debug, Default, Deserialize)]
struct Fixtures {
    #[serde(default)]
    profiles: HashMap<String, Profile>,
    #[serde(default)]
    decks: Vec<Deck>,
}

/// In-memory profile and deck storage
pub struct MemoryStorage {
    profiles: RwLock<HashMap<String, Profile>>,
    decks: RwLock<HashMap<String, Deck>>,
    guest_profile: Option<Profile>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            decks: RwLock::new(HashMap::new()),
            guest_profile: None,
        }
    }

    /// Storage that seats unknown players with a starter deck
    pub fn with_guest_profiles() -> Self {
        let starter = Deck {
            id: GUEST_DECK_ID.to_string(),
            name: "Starter Deck".to_string(),
            color: "Red".to_string(),
            decklist: Vec::new(),
            author_id: "system".to_string(),
        };

        let mut decks = HashMap::new();
        decks.insert(starter.id.clone(), starter);

        Self {
            profiles: RwLock::new(HashMap::new()),
            decks: RwLock::new(decks),
            guest_profile: Some(Profile {
                active_deck: GUEST_DECK_ID.to_string(),
                avatar: GUEST_AVATAR.to_string(),
                sleeve: GUEST_SLEEVE.to_string(),
            }),
        }
    }

    pub async fn insert_profile(&self, username: &str, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(username.to_string(), profile);
    }

    pub async fn insert_deck(&self, deck: Deck) {
        self.decks.write().await.insert(deck.id.clone(), deck);
    }

    /// Load profiles and decks from a JSON document; returns how many
    /// records were added
    pub async fn load_fixtures(&self, json: &str) -> Result<usize> {
        let fixtures: Fixtures = serde_json::from_str(json)?;
        let count = fixtures.profiles.len() + fixtures.decks.len();

        {
            let mut profiles = self.profiles.write().await;
            profiles.extend(fixtures.profiles);
        }
        {
            let mut decks = self.decks.write().await;
            for deck in fixtures.decks {
                decks.insert(deck.id.clone(), deck);
            }
        }

        Ok(count)
    }

    pub async fn load_fixtures_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        self.load_fixtures(&json).await
    }

    async fn profile(&self, username: &str) -> Result<Profile> {
        if let Some(profile) = self.profiles.read().await.get(username) {
            return Ok(profile.clone());
        }
        self.guest_profile
            .clone()
            .ok_or_else(|| RelayError::ProfileNotFound(username.to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStorage for MemoryStorage {
    async fn active_deck(&self, username: &str) -> Result<String> {
        Ok(self.profile(username).await?.active_deck)
    }

    async fn avatar(&self, username: &str) -> Result<String> {
        Ok(self.profile(username).await?.avatar)
    }

    async fn sleeve(&self, username: &str) -> Result<String> {
        Ok(self.profile(username).await?.sleeve)
    }
}

#[async_trait]
impl DeckStorage for MemoryStorage {
    async fn get_deck(&self, deck_id: &str) -> Result<Deck> {
        self.decks
            .read()
            .await
            .get(deck_id)
            .cloned()
            .ok_or_else(|| RelayError::DeckNotFound(deck_id.to_string()))
    }
}
