//! Persistence for the broadcast roster

pub mod roster;

// Re-exports for convenience
pub use roster::{FileRoster, InMemoryRoster, Roster};
