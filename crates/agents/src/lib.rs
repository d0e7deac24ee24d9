//! Specialized agents and the supervisor for riad.
//!
//! Each agent is a pure function over the conversation: it reads state
//! and the inbound message, calls its tool adapters, and returns a reply
//! plus an immutable `StateDelta`. The supervisor picks the agent —
//! continuing an in-progress flow when the agent's own `can_continue`
//! predicate accepts the message, classifying intent otherwise — and
//! commits the delta atomically.

pub mod alerts;
pub mod legal;
pub mod negotiation;
pub mod parse;
pub mod router;
pub mod search;
pub mod smalltalk;
pub mod supervisor;

use async_trait::async_trait;
use riad_core::conversation::{Conversation, InboundMessage, StateDelta};
use riad_core::error::Result;
use riad_core::intent::RouteTarget;

pub use alerts::AlertsAgent;
pub use legal::LegalAgent;
pub use negotiation::NegotiationAgent;
pub use router::IntentRouter;
pub use search::SearchAgent;
pub use smalltalk::SmalltalkAgent;
pub use supervisor::{Supervisor, TurnOutcome};

/// What one agent produced for one turn.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub reply: String,
    pub delta: StateDelta,
}

impl AgentOutcome {
    /// A reply that changes nothing.
    pub fn reply_only(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delta: StateDelta::none(),
        }
    }
}

/// A specialized agent the supervisor can dispatch to.
///
/// Agents never mutate the conversation: `handle` takes it by shared
/// reference and describes changes through the returned delta, which is
/// what makes failure rollback a non-event — an errored turn simply
/// commits no delta.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The routing label this agent serves.
    fn target(&self) -> RouteTarget;

    /// Whether this message plausibly continues the agent's in-progress
    /// flow (a bare selection, a yes/no, a numeric offer, ...). Only
    /// consulted when the conversation's active flow belongs to this
    /// agent; a `true` skips intent classification entirely.
    fn can_continue(&self, conversation: &Conversation, message: &InboundMessage) -> bool;

    /// Produce the reply and state delta for this turn.
    async fn handle(
        &self,
        conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome>;
}
