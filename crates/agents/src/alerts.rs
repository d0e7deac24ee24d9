//! Alerts agent — creates, lists, and cancels property alerts.
//!
//! Single-turn operations: the alerts agent owns no flow of its own.
//! The only cross-turn link is a `pending_alert` stashed by an empty
//! search, which creation consumes.

use async_trait::async_trait;
use riad_core::adapter::AlertStore;
use riad_core::alert::AlertCriteria;
use riad_core::conversation::{Conversation, InboundMessage, StateDelta};
use riad_core::error::Result;
use riad_core::intent::RouteTarget;
use std::sync::Arc;
use tracing::info;

use crate::parse::{mentions_any, parse_criteria, parse_selection};
use crate::{Agent, AgentOutcome};

pub struct AlertsAgent {
    alerts: Arc<dyn AlertStore>,
}

impl AlertsAgent {
    pub fn new(alerts: Arc<dyn AlertStore>) -> Self {
        Self { alerts }
    }

    async fn list(&self, conversation: &Conversation) -> Result<AgentOutcome> {
        let records = self.alerts.list_active(&conversation.user).await?;
        if records.is_empty() {
            return Ok(AgentOutcome::reply_only(
                "Tu n'as aucune alerte active pour le moment.\n\n💡 Lance une \
                 recherche : si aucun bien ne correspond, je te proposerai d'en créer une !",
            ));
        }

        let mut reply = format!("🔔 Tu as {} alerte(s) active(s) :\n", records.len());
        for (i, record) in records.iter().enumerate() {
            reply.push_str(&format!("\n{}. {}", i + 1, record.criteria.describe()));
        }
        reply.push_str("\n\n💡 Pour en supprimer une, dis « supprime l'alerte 1 ».");
        Ok(AgentOutcome::reply_only(reply))
    }

    async fn cancel(&self, conversation: &Conversation, position: usize) -> Result<AgentOutcome> {
        let records = self.alerts.list_active(&conversation.user).await?;
        if position == 0 || position > records.len() {
            return Ok(AgentOutcome::reply_only(format!(
                "Je n'ai que {} alerte(s) — indique un numéro entre 1 et {}.",
                records.len(),
                records.len().max(1)
            )));
        }

        let record = &records[position - 1];
        self.alerts.cancel(&conversation.user, &record.id).await?;
        info!(owner = %conversation.user, id = %record.id, "Alert cancelled");
        Ok(AgentOutcome::reply_only(
            "✅ Alerte supprimée ! Tu ne recevras plus de notifications pour ces critères.",
        ))
    }

    async fn create(
        &self,
        conversation: &Conversation,
        criteria: AlertCriteria,
    ) -> Result<AgentOutcome> {
        if !criteria.is_actionable() {
            return Ok(AgentOutcome::reply_only(
                "Pour créer une alerte, donne-moi au moins une ville ou un budget. \
                 Par exemple : « alerte appartement à Rabat moins de 8000 dh ». 🔔",
            ));
        }

        self.alerts.upsert(&conversation.user, criteria.clone()).await?;
        let consumed_pending = conversation.pending_alert.is_some();
        let delta = if consumed_pending {
            StateDelta::none().set_pending_alert(None)
        } else {
            StateDelta::none()
        };
        Ok(AgentOutcome {
            reply: format!(
                "✅ Alerte créée !\n\n🔔 Je te préviens dès qu'un bien correspondant \
                 arrive.\n📋 Tes critères : {}",
                criteria.describe()
            ),
            delta,
        })
    }
}

#[async_trait]
impl Agent for AlertsAgent {
    fn target(&self) -> RouteTarget {
        RouteTarget::Alerts
    }

    fn can_continue(&self, _conversation: &Conversation, _message: &InboundMessage) -> bool {
        // Alerts never own the active flow
        false
    }

    async fn handle(
        &self,
        conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome> {
        let text = &message.text;

        if mentions_any(text, &["supprime", "supprimer", "annule", "annuler", "retire"]) {
            if let Some(position) = parse_selection(text) {
                return self.cancel(conversation, position).await;
            }
            return Ok(AgentOutcome::reply_only(
                "Quelle alerte veux-tu supprimer ? Donne-moi son numéro \
                 (« mes alertes » pour les voir).",
            ));
        }

        if mentions_any(text, &["mes alertes", "liste", "lister", "voir"]) {
            return self.list(conversation).await;
        }

        // Creation: explicit criteria in the message, else whatever the
        // last empty search proposed.
        let parsed = parse_criteria(text);
        let criteria = if !parsed.is_empty() {
            AlertCriteria {
                location: parsed.location,
                property_type: parsed.property_type,
                transaction: parsed.transaction,
                min_price: parsed.min_price,
                max_price: parsed.max_price,
                bedrooms: parsed.bedrooms,
            }
        } else if let Some(pending) = &conversation.pending_alert {
            pending.clone()
        } else {
            AlertCriteria::default()
        };

        self.create(conversation, criteria).await
    }
}
