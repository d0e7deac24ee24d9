//! Search agent — finds listings, presents a numbered list, resolves
//! positional selections, and proposes an alert when nothing matches.

use async_trait::async_trait;
use riad_core::alert::AlertCriteria;
use riad_core::adapter::{AlertStore, PropertySearch};
use riad_core::conversation::{Conversation, FlowAgent, InboundMessage, StateDelta};
use riad_core::error::{Result, RouteError};
use riad_core::intent::RouteTarget;
use riad_core::listing::{ListingSummary, SearchCriteria, format_price};
use std::sync::Arc;
use tracing::{debug, info};

use crate::parse::{is_affirmative, is_negative, parse_criteria, parse_selection};
use crate::{Agent, AgentOutcome};

pub struct SearchAgent {
    search: Arc<dyn PropertySearch>,
    alerts: Arc<dyn AlertStore>,
    max_results: usize,
}

impl SearchAgent {
    pub fn new(
        search: Arc<dyn PropertySearch>,
        alerts: Arc<dyn AlertStore>,
        max_results: usize,
    ) -> Self {
        Self {
            search,
            alerts,
            max_results,
        }
    }

    /// Numbered presentation; the user picks by position, internal ids
    /// never reach the wire.
    fn format_results(results: &[ListingSummary]) -> String {
        let mut out = String::from("Voici ce que j'ai trouvé 🎉\n");
        for (i, listing) in results.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {}\n   📍 {} · 💰 {} · 🛏️ {} ch",
                i + 1,
                listing.title,
                listing.location,
                format_price(listing.price),
                listing.bedrooms,
            ));
            if let Some(surface) = listing.surface {
                out.push_str(&format!(" · 📐 {} m²", surface.round() as i64));
            }
        }
        out.push_str("\n\n👉 Réponds avec le numéro du bien qui t'intéresse !");
        out
    }

    fn format_selection(listing: &ListingSummary) -> String {
        format!(
            "Bon choix ! {} à {} — {} ({}).\n\
             Tu veux plus de détails, ou négocier le prix ?",
            listing.title,
            listing.location,
            format_price(listing.price),
            listing.transaction,
        )
    }

    /// Alert proposal shown when a search comes back empty.
    fn format_empty(criteria: &SearchCriteria) -> String {
        let mut out = String::from("Aucun bien ne correspond à ces critères 😕\n");
        if let Some(loc) = &criteria.location {
            out.push_str(&format!("\n💡 Essaie d'élargir à d'autres quartiers de {loc}."));
        }
        if criteria.max_price.is_some() {
            out.push_str("\n💡 Ou augmente un peu ton budget.");
        }
        out.push_str(
            "\n\n🔔 Tu veux que je te prévienne dès qu'un bien correspondant arrive ? \
             Réponds « Oui » pour créer une alerte !",
        );
        out
    }

    async fn run_search(&self, criteria: SearchCriteria) -> Result<AgentOutcome> {
        let results = self.search.search(&criteria).await?;

        if results.is_empty() {
            let alert = AlertCriteria {
                location: criteria.location.clone(),
                property_type: criteria.property_type.clone(),
                transaction: criteria.transaction,
                min_price: criteria.min_price,
                max_price: criteria.max_price,
                bedrooms: criteria.bedrooms,
            };
            let reply = Self::format_empty(&criteria);
            let delta = StateDelta::none()
                .set_active(Some(FlowAgent::Search))
                .set_results(Vec::new())
                .set_last_listing(None)
                .set_pending_alert(alert.is_actionable().then_some(alert));
            return Ok(AgentOutcome { reply, delta });
        }

        let top: Vec<ListingSummary> = results.into_iter().take(self.max_results).collect();
        info!(count = top.len(), "Presenting search results");

        let reply = Self::format_results(&top);
        let delta = StateDelta::none()
            .set_active(Some(FlowAgent::Search))
            .set_results(top)
            .set_last_listing(None)
            .set_pending_alert(None);
        Ok(AgentOutcome { reply, delta })
    }

    async fn resolve_selection(
        &self,
        conversation: &Conversation,
        index: usize,
    ) -> Result<AgentOutcome> {
        let available = conversation.last_results.len();
        if index == 0 || index > available {
            return Err(RouteError::InvalidContinuation { index, available }.into());
        }

        let listing = &conversation.last_results[index - 1];
        debug!(index, listing = %listing.id, "Selection resolved");

        let reply = Self::format_selection(listing);
        let delta = StateDelta::none()
            .set_active(Some(FlowAgent::Search))
            .set_last_listing(Some(listing.id.clone()));
        Ok(AgentOutcome { reply, delta })
    }

    /// "Oui" after an empty search: materialize the stashed alert.
    async fn confirm_pending_alert(
        &self,
        conversation: &Conversation,
        criteria: AlertCriteria,
    ) -> Result<AgentOutcome> {
        self.alerts.upsert(&conversation.user, criteria.clone()).await?;
        let reply = format!(
            "✅ Alerte créée !\n\n🔔 Je te préviens dès qu'un bien correspondant arrive.\n\
             📋 Tes critères : {}\n\n\
             💡 Tu peux continuer à chercher d'autres biens en attendant !",
            criteria.describe()
        );
        let delta = StateDelta::none()
            .set_active(None)
            .set_pending_alert(None);
        Ok(AgentOutcome { reply, delta })
    }
}

#[async_trait]
impl Agent for SearchAgent {
    fn target(&self) -> RouteTarget {
        RouteTarget::Search
    }

    fn can_continue(&self, conversation: &Conversation, message: &InboundMessage) -> bool {
        if conversation.active_agent != Some(FlowAgent::Search) {
            return false;
        }
        if message.image.is_some() {
            return true;
        }
        if !conversation.last_results.is_empty() && parse_selection(&message.text).is_some() {
            return true;
        }
        if conversation.pending_alert.is_some()
            && (is_affirmative(&message.text) || is_negative(&message.text))
        {
            return true;
        }
        // Refinements mention concrete criteria
        !parse_criteria(&message.text).is_empty()
    }

    async fn handle(
        &self,
        conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome> {
        // Pending alert confirmation has priority over everything else:
        // the user was just asked a yes/no question.
        if let Some(criteria) = &conversation.pending_alert {
            if is_affirmative(&message.text) {
                return self.confirm_pending_alert(conversation, criteria.clone()).await;
            }
            if is_negative(&message.text) {
                let delta = StateDelta::none()
                    .set_active(None)
                    .set_pending_alert(None);
                return Ok(AgentOutcome {
                    reply: "Pas de souci ! Dis-moi si tu veux ajuster tes critères. 🏡".into(),
                    delta,
                });
            }
        }

        // Positional selection against the last presented list
        if conversation.active_agent == Some(FlowAgent::Search)
            && !conversation.last_results.is_empty()
            && message.image.is_none()
        {
            if let Some(index) = parse_selection(&message.text) {
                return self.resolve_selection(conversation, index).await;
            }
        }

        // Fresh or refined query
        let mut criteria = parse_criteria(&message.text);
        if let Some(image) = &message.image {
            criteria.similar_to = Some(image.0.clone());
        }

        if criteria.is_empty() {
            return Ok(AgentOutcome::reply_only(
                "Avec plaisir ! Dis-moi la ville, le type de bien et ton budget, \
                 ou envoie-moi une photo d'un bien qui te plaît. 🔍",
            ));
        }

        self.run_search(criteria).await
    }
}
