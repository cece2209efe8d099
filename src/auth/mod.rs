//! Connection identity

pub mod identity;

// Re-export main components
pub use identity::{validate_display_name, HeaderIdentityResolver, IdentityResolver};
