//! Negotiation agent — discusses price on the listing the user selected.
//!
//! Represents the seller side: never reveals the floor price, refuses
//! offers below it, counters fair offers by meeting in the middle, and
//! accepts anything at or above asking. The math itself is pure and
//! lives in `riad_tools::negotiation`.

use async_trait::async_trait;
use riad_config::NegotiationConfig;
use riad_core::conversation::{
    Conversation, FlowAgent, InboundMessage, NegotiationContext, StateDelta,
};
use riad_core::error::Result;
use riad_core::intent::RouteTarget;
use riad_core::listing::{ListingSummary, format_price};
use riad_tools::negotiation::{OfferClass, classify_offer, counter_offer, margin_for, suggest_range};
use tracing::{debug, info};

use crate::parse::{is_affirmative, is_deal, is_negative, parse_amount};
use crate::{Agent, AgentOutcome};

const PICK_A_LISTING: &str = "Avec plaisir ! Dis-moi d'abord quel bien t'intéresse — \
                              lance une recherche et choisis un numéro dans la liste. 🏡";

pub struct NegotiationAgent {
    policy: NegotiationConfig,
}

impl NegotiationAgent {
    pub fn new(policy: NegotiationConfig) -> Self {
        Self { policy }
    }

    fn selected_listing<'a>(&self, conversation: &'a Conversation) -> Option<&'a ListingSummary> {
        let id = conversation.last_listing.as_ref()?;
        conversation.last_results.iter().find(|l| &l.id == id)
    }

    fn open_flow(&self, listing: &ListingSummary) -> AgentOutcome {
        let margin = margin_for(&listing.location, &listing.property_type, &self.policy);
        let suggested = suggest_range(listing.price, margin);
        debug!(listing = %listing.id, margin, "Negotiation flow opened");

        let reply = format!(
            "{} est affiché à {}. Fais-moi ta meilleure offre, je la transmets \
             au propriétaire ! 💰",
            listing.title,
            format_price(listing.price),
        );
        let context = NegotiationContext {
            listing: listing.id.clone(),
            asking_price: listing.price,
            offer: None,
            suggested,
        };
        AgentOutcome {
            reply,
            delta: StateDelta::none()
                .set_active(Some(FlowAgent::Negotiation))
                .set_negotiation(Some(context)),
        }
    }

    fn accept(&self, listing: &ListingSummary, price: f64) -> AgentOutcome {
        info!(listing = %listing.id, price, "Offer accepted");
        AgentOutcome {
            reply: format!(
                "🎉 Marché conclu à {} pour {} ! Je prépare le dossier — \
                 pense à vérifier les aspects juridiques avant de signer.",
                format_price(price),
                listing.title,
            ),
            delta: StateDelta::clear_flow(),
        }
    }

    fn evaluate_offer(
        &self,
        listing: &ListingSummary,
        context: &NegotiationContext,
        offer: f64,
    ) -> AgentOutcome {
        let (low, high) = context.suggested;
        let updated = NegotiationContext {
            offer: Some(offer),
            ..context.clone()
        };

        match classify_offer(offer, context.suggested) {
            OfferClass::Low => AgentOutcome {
                reply: format!(
                    "Ton offre de {} est trop basse pour ce bien — le propriétaire \
                     n'acceptera pas. Une fourchette raisonnable se situe entre {} \
                     et {}. Tu veux réessayer ?",
                    format_price(offer),
                    format_price(low),
                    format_price(high),
                ),
                delta: StateDelta::none().set_negotiation(Some(updated)),
            },
            OfferClass::Fair => {
                let counter = counter_offer(offer, context.asking_price);
                AgentOutcome {
                    reply: format!(
                        "{} : c'est une offre correcte ! Le propriétaire demande {}, \
                         je te propose de couper la poire en deux à {}. Deal ?",
                        format_price(offer),
                        format_price(context.asking_price),
                        format_price(counter),
                    ),
                    delta: StateDelta::none().set_negotiation(Some(updated)),
                }
            }
            OfferClass::Strong => self.accept(listing, offer),
        }
    }
}

#[async_trait]
impl Agent for NegotiationAgent {
    fn target(&self) -> RouteTarget {
        RouteTarget::Negotiation
    }

    fn can_continue(&self, conversation: &Conversation, message: &InboundMessage) -> bool {
        conversation.active_agent == Some(FlowAgent::Negotiation)
            && (parse_amount(&message.text).is_some()
                || is_deal(&message.text)
                || is_affirmative(&message.text)
                || is_negative(&message.text))
    }

    async fn handle(
        &self,
        conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome> {
        // No selected listing: ask for one, own nothing.
        let Some(listing) = self.selected_listing(conversation) else {
            return Ok(AgentOutcome::reply_only(PICK_A_LISTING));
        };

        let Some(context) = conversation.negotiation.as_ref() else {
            return Ok(self.open_flow(listing));
        };

        // Terminal: the user takes the deal (either the counter-offer or
        // the asking price).
        if is_deal(&message.text) || (is_affirmative(&message.text) && !is_negative(&message.text))
        {
            let price = context.offer.map_or(context.asking_price, |offer| {
                counter_offer(offer, context.asking_price)
            });
            return Ok(self.accept(listing, price));
        }

        if is_negative(&message.text) {
            return Ok(AgentOutcome::reply_only(
                "Je comprends ! Fais-moi une autre proposition, ou dis-moi si tu \
                 préfères regarder d'autres biens. 🤝",
            ));
        }

        if let Some(offer) = parse_amount(&message.text) {
            return Ok(self.evaluate_offer(listing, context, offer));
        }

        Ok(AgentOutcome::reply_only(
            "Indique-moi un montant en MAD et je le transmets au propriétaire. 💬",
        ))
    }
}
