//! Error types for the riad domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all riad operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Routing errors ---
    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    // --- Tool adapter errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Gateway / transport errors ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while routing a turn to an agent. All of these are
/// recovered at the supervisor boundary and turned into a user-facing
/// reply — they never reach the transport.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    #[error("Intent classification too ambiguous (confidence {confidence:.2})")]
    ClassificationAmbiguous { confidence: f32 },

    #[error("Selection {index} is outside the last result list (1..={available})")]
    InvalidContinuation { index: usize, available: usize },

    #[error("Turn abandoned after {timeout_secs}s waiting on a tool")]
    Timeout { timeout_secs: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool unavailable: {tool} — {reason}")]
    Unavailable { tool: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation store unreachable: {0}")]
    Unavailable(String),

    #[error("Stale write for {user}: stored version {stored}, expected {expected}")]
    Conflict {
        user: String,
        stored: u64,
        expected: u64,
    },

    #[error("Conversation serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed via {transport}: {reason}")]
    DeliveryFailed { transport: String, reason: String },
}
