//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use riad_core::adapter::ConversationStore;
use riad_core::conversation::{Conversation, UserId};
use riad_core::error::StoreError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store keeping one conversation document per identity.
/// Versions are checked on save exactly like the durable backend, so the
/// orchestration's rollback and lost-update tests run against the same
/// contract.
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<UserId, Conversation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn load(&self, user: &UserId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.entries.read().await.get(user).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if let Some(stored) = entries.get(&conversation.user) {
            if stored.version + 1 != conversation.version {
                return Err(StoreError::Conflict {
                    user: conversation.user.0.clone(),
                    stored: stored.version,
                    expected: conversation.version.saturating_sub(1),
                });
            }
        }
        entries.insert(conversation.user.clone(), conversation.clone());
        Ok(())
    }
}
