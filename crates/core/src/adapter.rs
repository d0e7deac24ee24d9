//! Seam traits for the external collaborators the agents call.
//!
//! Every side-effecting dependency — the property catalog, the legal
//! knowledge base, the alert store, the conversation store — is defined
//! as a trait here and implemented outward. Agents hold `Arc<dyn ...>`
//! handles, which is what makes the orchestration core testable with
//! hand-written stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::{AlertCriteria, AlertId, AlertRecord};
use crate::conversation::{Conversation, UserId};
use crate::error::{StoreError, ToolError};
use crate::listing::{ListingSummary, SearchCriteria};

/// Property catalog search.
///
/// Implementations must return results in a deterministic order (price
/// ascending, then recency, then id) so that positional follow-ups
/// ("the 2nd one") are reproducible.
#[async_trait]
pub trait PropertySearch: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ListingSummary>, ToolError>;
}

/// One retrieved passage from the legal knowledge corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub text: String,

    /// Document the passage came from
    pub source: String,

    /// Relevance in `[0, 1]`, higher is better
    pub score: f32,
}

/// Retrieval over the legal knowledge corpus. Returns up to `k` passages
/// ordered by descending relevance.
#[async_trait]
pub trait LegalRetrieval: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>, ToolError>;
}

/// Persistent alert criteria, keyed by owner identity.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Store criteria for an owner. Idempotent: identical criteria for
    /// the same owner return the already-stored alert's id instead of
    /// creating a duplicate.
    async fn upsert(&self, owner: &UserId, criteria: AlertCriteria)
    -> Result<AlertId, ToolError>;

    /// All active alerts for an owner, oldest first.
    async fn list_active(&self, owner: &UserId) -> Result<Vec<AlertRecord>, ToolError>;

    /// Cancel one alert. Returns false when it did not exist (or belongs
    /// to someone else).
    async fn cancel(&self, owner: &UserId, id: &AlertId) -> Result<bool, ToolError>;
}

/// Durable conversation state, one document per identity.
///
/// `save` is a compare-and-swap: it only succeeds when the stored version
/// is exactly one behind the incoming document, so a lost-update between
/// load and save surfaces as `StoreError::Conflict` instead of silently
/// overwriting.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, user: &UserId) -> Result<Option<Conversation>, StoreError>;

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_passage_serialization() {
        let p = ScoredPassage {
            text: "Les frais de notaire représentent environ 6 à 7% du prix.".into(),
            source: "frais_acquisition.md".into(),
            score: 0.82,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("notaire"));
        let back: ScoredPassage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source, "frais_acquisition.md");
    }
}
