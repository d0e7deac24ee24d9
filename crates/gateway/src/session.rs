//! Per-identity turn serialization.
//!
//! One async mutex per identity: two messages from the same user are
//! processed strictly one after the other, while different identities
//! proceed fully in parallel. The lock wraps a single conversation's
//! load → route → save — never anything across identities.

use riad_core::conversation::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct SessionMap {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the identity's turn lock, creating it on first contact.
    pub async fn acquire(&self, user: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(user.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new()
    }
}
