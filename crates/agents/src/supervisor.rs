//! The supervisor — routes each inbound message to one agent and commits
//! exactly one state transition per turn.
//!
//! Dispatch order:
//! 1. An explicit reset command wipes the active flow.
//! 2. If an agent owns the active flow and its `can_continue` accepts the
//!    message, dispatch there without re-classifying intent — this is
//!    what keeps "le 2" mid-search from being re-routed.
//! 3. Otherwise classify; `Unknown` yields a clarification reply and no
//!    state change.
//!
//! Failure semantics: a tool error, an out-of-range selection, or a
//! timeout inside an agent never escapes — the outcome becomes a
//! user-facing reply with an **empty delta**, so persisted state rolls
//! back to its pre-turn values by construction.

use riad_core::conversation::{Conversation, FlowAgent, InboundMessage, StateDelta, Turn};
use riad_core::error::{Error, RouteError};
use riad_core::intent::RouteTarget;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::parse::is_reset;
use crate::router::IntentRouter;
use crate::Agent;

const CLARIFICATION: &str =
    "Hmm 🤔 Je ne suis pas sûr de comprendre. Tu veux chercher un bien, négocier \
     un prix, poser une question juridique, ou gérer tes alertes ?";

const TOOL_APOLOGY: &str =
    "Désolé, un de mes outils ne répond pas pour le moment. 😓 Réessaie dans un \
     instant, rien n'a été perdu.";

const TIMEOUT_APOLOGY: &str =
    "Désolé, ça prend plus de temps que prévu. ⏳ Réessaie dans un instant, rien \
     n'a été perdu.";

const RESET_REPLY: &str =
    "C'est reparti de zéro ! 🧹 Dis-moi ce que tu cherches.";

const EMPTY_MESSAGE_REPLY: &str =
    "Hey ! 👋 Tu voulais me dire quelque chose ? Envoie-moi un message ou une \
     photo de bien !";

/// Everything one turn produced. The delta is already applied when this
/// comes back from `take_turn`.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub delta: StateDelta,
    pub agent: RouteTarget,
    pub error: Option<String>,
}

impl TurnOutcome {
    fn recovered(reply: &str, agent: RouteTarget, error: Option<String>) -> Self {
        Self {
            reply: reply.to_string(),
            delta: StateDelta::none(),
            agent,
            error,
        }
    }
}

pub struct Supervisor {
    agents: Vec<Arc<dyn Agent>>,
    router: IntentRouter,
    turn_timeout: Duration,
    history_limit: usize,
}

impl Supervisor {
    pub fn new(
        agents: Vec<Arc<dyn Agent>>,
        router: IntentRouter,
        turn_timeout: Duration,
        history_limit: usize,
    ) -> Self {
        Self {
            agents,
            router,
            turn_timeout,
            history_limit,
        }
    }

    fn agent_for(&self, target: RouteTarget) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.target() == target)
    }

    /// Pick the agent and produce the turn's outcome. Pure with respect
    /// to the conversation; `take_turn` is the committing wrapper.
    pub async fn route(&self, conversation: &Conversation, message: &InboundMessage) -> TurnOutcome {
        if message.is_empty() {
            return TurnOutcome::recovered(EMPTY_MESSAGE_REPLY, RouteTarget::Smalltalk, None);
        }

        if is_reset(&message.text) {
            info!(user = %conversation.user, "Conversation reset");
            return TurnOutcome {
                reply: RESET_REPLY.into(),
                delta: StateDelta::clear_flow()
                    .set_results(Vec::new())
                    .set_last_listing(None),
                agent: RouteTarget::Smalltalk,
                error: None,
            };
        }

        // Continuation first: no classifier flapping mid-flow.
        if let Some(flow) = conversation.active_agent {
            if let Some(agent) = self.agent_for(flow.into()) {
                if agent.can_continue(conversation, message) {
                    debug!(agent = %agent.target(), "Continuing active flow");
                    let outcome = self.dispatch(agent.as_ref(), conversation, message).await;
                    return Self::sweep_abandoned_flow(conversation, outcome);
                }
            }
        }

        let decision = self.router.classify(message);
        info!(
            target = %decision.target,
            confidence = decision.confidence,
            rationale = %decision.rationale,
            "Routing decision"
        );

        let Some(agent) = self.agent_for(decision.target) else {
            // Unknown, or a label nobody registered for
            let error = (decision.target == RouteTarget::Unknown && decision.confidence > 0.0)
                .then(|| {
                    RouteError::ClassificationAmbiguous {
                        confidence: decision.confidence,
                    }
                    .to_string()
                });
            return TurnOutcome::recovered(CLARIFICATION, RouteTarget::Unknown, error);
        };

        let outcome = self.dispatch(agent.as_ref(), conversation, message).await;
        Self::sweep_abandoned_flow(conversation, outcome)
    }

    /// A turn that hands the flow to another agent implicitly ends a
    /// negotiation in progress: its context must not outlive the flow.
    fn sweep_abandoned_flow(conversation: &Conversation, mut outcome: TurnOutcome) -> TurnOutcome {
        if conversation.negotiation.is_some()
            && outcome.delta.negotiation.is_none()
            && matches!(outcome.delta.active_agent, Some(active) if active != Some(FlowAgent::Negotiation))
        {
            outcome.delta.negotiation = Some(None);
        }
        outcome
    }

    /// Run one agent under the turn timeout, converting every failure
    /// into a recovered outcome with an empty delta.
    async fn dispatch(
        &self,
        agent: &dyn Agent,
        conversation: &Conversation,
        message: &InboundMessage,
    ) -> TurnOutcome {
        let target = agent.target();
        match tokio::time::timeout(self.turn_timeout, agent.handle(conversation, message)).await {
            Ok(Ok(outcome)) => TurnOutcome {
                reply: outcome.reply,
                delta: outcome.delta,
                agent: target,
                error: None,
            },
            Ok(Err(Error::Route(RouteError::InvalidContinuation { index, available }))) => {
                debug!(index, available, "Out-of-range selection");
                let reply = format!(
                    "Je n'ai que {available} bien(s) dans la dernière liste — choisis \
                     un numéro entre 1 et {available} 😉"
                );
                TurnOutcome {
                    reply,
                    delta: StateDelta::none(),
                    agent: target,
                    error: Some(
                        RouteError::InvalidContinuation { index, available }.to_string(),
                    ),
                }
            }
            Ok(Err(e)) => {
                warn!(agent = %target, error = %e, "Agent failed; rolling back turn");
                TurnOutcome::recovered(TOOL_APOLOGY, target, Some(e.to_string()))
            }
            Err(_) => {
                let timeout_secs = self.turn_timeout.as_secs();
                warn!(agent = %target, timeout_secs, "Turn timed out; rolling back");
                TurnOutcome::recovered(
                    TIMEOUT_APOLOGY,
                    target,
                    Some(RouteError::Timeout { timeout_secs }.to_string()),
                )
            }
        }
    }

    /// Route, then commit: apply the delta and append the turn in one
    /// mutation. The returned outcome carries the already-applied delta.
    pub async fn take_turn(
        &self,
        conversation: &mut Conversation,
        message: &InboundMessage,
    ) -> TurnOutcome {
        let outcome = self.route(conversation, message).await;
        let turn = Turn {
            received_at: chrono::Utc::now(),
            inbound: message.text.clone(),
            reply: outcome.reply.clone(),
            agent: outcome.agent,
            error: outcome.error.clone(),
        };
        conversation.commit_turn(outcome.delta.clone(), turn, self.history_limit);
        outcome
    }
}
