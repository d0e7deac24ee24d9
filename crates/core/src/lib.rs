//! # riad Core
//!
//! Domain types, traits, and error definitions for the riad conversational
//! real-estate assistant. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod adapter;
pub mod alert;
pub mod conversation;
pub mod error;
pub mod event;
pub mod intent;
pub mod listing;

// Re-export key types at crate root for ergonomics
pub use adapter::{AlertStore, ConversationStore, LegalRetrieval, PropertySearch, ScoredPassage};
pub use alert::{AlertCriteria, AlertId, AlertRecord};
pub use conversation::{
    Conversation, FlowAgent, ImageRef, InboundMessage, NegotiationContext, StateDelta, Turn,
    UserId,
};
pub use error::{Error, GatewayError, Result, RouteError, StoreError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use intent::{IntentDecision, RouteTarget};
pub use listing::{ListingId, ListingSummary, SearchCriteria, TransactionKind};
