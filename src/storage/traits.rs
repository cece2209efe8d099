//! Collaborator interfaces for player profiles and decks
//!
//! The relay only reads from these. Accounts and deck building live in
//! other services; any backend able to answer these lookups can be plugged in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A stored deck. Only its existence matters to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub color: String,
    pub decklist: Vec<String>,
    pub author_id: String,
}

/// The parts of a user profile needed to seat a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub active_deck: String,
    pub avatar: String,
    pub sleeve: String,
}

/// User profile lookups by display name
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    /// Id of the deck the user currently plays
    async fn active_deck(&self, username: &str) -> Result<String>;

    /// Avatar shown next to the user's board
    async fn avatar(&self, username: &str) -> Result<String>;

    /// Card sleeve cosmetic
    async fn sleeve(&self, username: &str) -> Result<String>;
}

/// Deck lookups by id
#[async_trait]
pub trait DeckStorage: Send + Sync {
    async fn get_deck(&self, deck_id: &str) -> Result<Deck>;
}
