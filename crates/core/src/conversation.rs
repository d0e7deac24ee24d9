//! Conversation state — the single document the supervisor mutates.
//!
//! One `Conversation` per user identity. Agents never touch it directly:
//! they return an immutable `StateDelta` describing exactly which fields
//! change, and the supervisor applies the delta together with the turn in
//! one `commit_turn` call. A failed turn commits an empty delta, which is
//! what makes the rollback guarantee mechanical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertCriteria;
use crate::intent::RouteTarget;
use crate::listing::{ListingId, ListingSummary};

/// Stable identity of one conversation: the user's transport address
/// (phone number for WhatsApp, account id for web chat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an attached image, resolved by the transport into
/// a similarity token before it reaches the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

/// One inbound transport message, normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl InboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: Some(ImageRef(token.into())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none()
    }
}

/// Which agent currently owns the conversation's flow, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAgent {
    Search,
    Negotiation,
    Legal,
}

impl From<FlowAgent> for RouteTarget {
    fn from(flow: FlowAgent) -> Self {
        match flow {
            FlowAgent::Search => RouteTarget::Search,
            FlowAgent::Negotiation => RouteTarget::Negotiation,
            FlowAgent::Legal => RouteTarget::Legal,
        }
    }
}

/// Negotiation state for the one listing currently under discussion.
/// Cleared when the flow ends (accepted, declined, or abandoned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationContext {
    pub listing: ListingId,
    pub asking_price: f64,

    /// The user's latest offer, once they named one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<f64>,

    /// Suggested acceptable range `(low, high)` from the margin policy
    pub suggested: (f64, f64),
}

/// One inbound message and the reply it produced. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub received_at: DateTime<Utc>,
    pub inbound: String,
    pub reply: String,

    /// The agent that produced the reply
    pub agent: RouteTarget,

    /// Set when the turn failed (tool unavailable, timeout, ...) and the
    /// reply is an apology; kept for observability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The set of field changes one agent proposes. `None` means "leave the
/// field alone"; `Some(value)` means "set it to value" (including
/// `Some(None)` for clearing an optional slot). Deltas live for exactly
/// one turn and are never persisted — only the conversation they apply
/// to is.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub active_agent: Option<Option<FlowAgent>>,
    pub last_listing: Option<Option<ListingId>>,
    pub last_results: Option<Vec<ListingSummary>>,
    pub negotiation: Option<Option<NegotiationContext>>,
    pub pending_alert: Option<Option<AlertCriteria>>,
}

impl StateDelta {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.active_agent.is_none()
            && self.last_listing.is_none()
            && self.last_results.is_none()
            && self.negotiation.is_none()
            && self.pending_alert.is_none()
    }

    /// Delta that ends whatever flow was active, used by the reset command
    /// and by terminal negotiation transitions.
    pub fn clear_flow() -> Self {
        Self {
            active_agent: Some(None),
            negotiation: Some(None),
            pending_alert: Some(None),
            ..Default::default()
        }
    }

    pub fn set_active(mut self, agent: Option<FlowAgent>) -> Self {
        self.active_agent = Some(agent);
        self
    }

    pub fn set_last_listing(mut self, listing: Option<ListingId>) -> Self {
        self.last_listing = Some(listing);
        self
    }

    pub fn set_results(mut self, results: Vec<ListingSummary>) -> Self {
        self.last_results = Some(results);
        self
    }

    pub fn set_negotiation(mut self, ctx: Option<NegotiationContext>) -> Self {
        self.negotiation = Some(ctx);
        self
    }

    pub fn set_pending_alert(mut self, criteria: Option<AlertCriteria>) -> Self {
        self.pending_alert = Some(criteria);
        self
    }
}

/// Durable per-user conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub user: UserId,

    /// The agent owning the current multi-turn flow, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_agent: Option<FlowAgent>,

    /// The listing the user selected from the last result list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_listing: Option<ListingId>,

    /// The last presented result list; "the K-th one" resolves against
    /// this exact list, 1-indexed, for the life of the search flow
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub last_results: Vec<ListingSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiation: Option<NegotiationContext>,

    /// Alert criteria proposed after an empty search, awaiting a "oui"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_alert: Option<AlertCriteria>,

    /// Bounded turn history, oldest trimmed
    #[serde(default)]
    pub history: Vec<Turn>,

    /// Monotonic version, bumped once per committed turn; the store's
    /// compare-and-swap checks it
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Fresh conversation for a first-time identity.
    pub fn new(user: UserId) -> Self {
        let now = Utc::now();
        Self {
            user,
            active_agent: None,
            last_listing: None,
            last_results: Vec::new(),
            negotiation: None,
            pending_alert: None,
            history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one agent's delta and append the turn — the single place
    /// conversation state mutates. Exactly one version bump per call,
    /// so a turn is at most one committed state transition.
    pub fn commit_turn(&mut self, delta: StateDelta, turn: Turn, history_limit: usize) {
        if let Some(v) = delta.active_agent {
            self.active_agent = v;
        }
        if let Some(v) = delta.last_listing {
            self.last_listing = v;
        }
        if let Some(v) = delta.last_results {
            self.last_results = v;
        }
        if let Some(v) = delta.negotiation {
            self.negotiation = v;
        }
        if let Some(v) = delta.pending_alert {
            self.pending_alert = v;
        }

        self.history.push(turn);
        if self.history.len() > history_limit {
            let excess = self.history.len() - history_limit;
            self.history.drain(..excess);
        }

        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Invariant between `active_agent` and its dependent slots: an
    /// owning agent must have the state its flow needs, or nothing is
    /// owned at all.
    pub fn is_consistent(&self) -> bool {
        match self.active_agent {
            Some(FlowAgent::Negotiation) => {
                self.last_listing.is_some() && self.negotiation.is_some()
            }
            Some(FlowAgent::Search) => {
                !self.last_results.is_empty() || self.pending_alert.is_some()
            }
            Some(FlowAgent::Legal) | None => true,
        }
    }
}
