//! Alert persistence and the listing-ingestion matcher.
//!
//! `InMemoryAlertStore` keeps active alert criteria per owner, with
//! idempotent creation: the same owner submitting identical criteria
//! twice keeps exactly one record. `AlertMatcher` is the ingestion-side
//! collaborator: fed each new listing, it finds matching alerts and
//! publishes an `AlertMatched` event per hit, bounded by each alert's
//! notification cap. Matched alerts stay active — later listings may
//! still match.

use async_trait::async_trait;
use chrono::Utc;
use riad_core::adapter::AlertStore;
use riad_core::alert::{AlertCriteria, AlertId, AlertRecord};
use riad_core::conversation::UserId;
use riad_core::error::ToolError;
use riad_core::event::{DomainEvent, EventBus};
use riad_core::listing::ListingSummary;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// In-memory alert store keyed by owner identity.
pub struct InMemoryAlertStore {
    alerts: Arc<RwLock<HashMap<UserId, Vec<AlertRecord>>>>,
    max_notifications: u32,
}

impl InMemoryAlertStore {
    pub fn new(max_notifications: u32) -> Self {
        Self {
            alerts: Arc::new(RwLock::new(HashMap::new())),
            max_notifications,
        }
    }

    /// All active alerts across owners (the matcher's view).
    pub async fn all_active(&self) -> Vec<AlertRecord> {
        self.alerts
            .read()
            .await
            .values()
            .flat_map(|v| v.iter().cloned())
            .collect()
    }

    async fn bump_notifications(&self, owner: &UserId, id: &AlertId) {
        let mut alerts = self.alerts.write().await;
        if let Some(records) = alerts.get_mut(owner) {
            if let Some(record) = records.iter_mut().find(|r| &r.id == id) {
                record.notifications_sent += 1;
            }
        }
    }
}

impl Default for InMemoryAlertStore {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn upsert(
        &self,
        owner: &UserId,
        criteria: AlertCriteria,
    ) -> Result<AlertId, ToolError> {
        if !criteria.is_actionable() {
            return Err(ToolError::InvalidArguments(
                "alert criteria need a location or a price bound".into(),
            ));
        }

        let mut alerts = self.alerts.write().await;
        let records = alerts.entry(owner.clone()).or_default();

        if let Some(existing) = records.iter().find(|r| r.criteria == criteria) {
            debug!(owner = %owner, id = %existing.id, "Identical alert already active");
            return Ok(existing.id.clone());
        }

        let record = AlertRecord {
            id: AlertId(Uuid::new_v4().to_string()),
            owner: owner.clone(),
            criteria,
            created_at: Utc::now(),
            notifications_sent: 0,
            max_notifications: self.max_notifications,
        };
        let id = record.id.clone();
        info!(owner = %owner, id = %id, "Alert created");
        records.push(record);
        Ok(id)
    }

    async fn list_active(&self, owner: &UserId) -> Result<Vec<AlertRecord>, ToolError> {
        Ok(self
            .alerts
            .read()
            .await
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn cancel(&self, owner: &UserId, id: &AlertId) -> Result<bool, ToolError> {
        let mut alerts = self.alerts.write().await;
        let Some(records) = alerts.get_mut(owner) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| &r.id != id);
        Ok(records.len() < before)
    }
}

/// Ingestion-side matcher: compares each newly scraped listing against
/// all stored criteria and publishes a notification event per hit.
pub struct AlertMatcher {
    store: Arc<InMemoryAlertStore>,
    events: Arc<EventBus>,
}

impl AlertMatcher {
    pub fn new(store: Arc<InMemoryAlertStore>, events: Arc<EventBus>) -> Self {
        Self { store, events }
    }

    /// Check one new listing. Returns the owners notified.
    pub async fn ingest(&self, listing: &ListingSummary) -> Vec<UserId> {
        let mut notified = Vec::new();

        for record in self.store.all_active().await {
            if record.notifications_sent >= record.max_notifications {
                continue;
            }
            if !record.criteria.matches(listing) {
                continue;
            }

            self.store
                .bump_notifications(&record.owner, &record.id)
                .await;
            self.events.publish(DomainEvent::AlertMatched {
                owner: record.owner.0.clone(),
                alert_id: record.id.0.clone(),
                listing_id: listing.id.0.clone(),
                timestamp: Utc::now(),
            });
            info!(owner = %record.owner, listing = %listing.id, "Alert matched");
            notified.push(record.owner.clone());
        }

        notified
    }
}
