//! Journal data types.
//!
//! - `mood`: the six-value mood enumeration with display glyphs
//! - `entry`: journal entries, drafts and tag normalisation
//! - `user`: user profile and preferences

pub mod entry;
pub mod mood;
pub mod user;

pub use entry::{normalize_tags, EntryDraft, JournalEntry};
pub use mood::Mood;
pub use user::User;
