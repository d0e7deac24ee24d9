//! Conversation store implementations for riad.
//!
//! Both backends implement the compare-and-swap `save` contract from
//! `riad_core::ConversationStore`: a write only lands when the stored
//! version is exactly one behind the incoming document.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
