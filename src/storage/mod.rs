//! Profile and deck collaborators consumed while seating players

pub mod memory;
pub mod traits;

pub use memory::MemoryStorage;
pub use traits::{Deck, DeckStorage, Profile, ProfileStorage};
