//! Routing labels and the per-turn classification decision.

use serde::{Deserialize, Serialize};

/// The fixed label set the router classifies over. `Unknown` never owns
/// a flow; it yields a clarification reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Search,
    Negotiation,
    Legal,
    Alerts,
    Smalltalk,
    Unknown,
}

impl RouteTarget {
    /// Tie-break priority when two labels score equally: higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            RouteTarget::Negotiation => 5,
            RouteTarget::Alerts => 4,
            RouteTarget::Search => 3,
            RouteTarget::Legal => 2,
            RouteTarget::Smalltalk => 1,
            RouteTarget::Unknown => 0,
        }
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RouteTarget::Search => "search",
            RouteTarget::Negotiation => "negotiation",
            RouteTarget::Legal => "legal",
            RouteTarget::Alerts => "alerts",
            RouteTarget::Smalltalk => "smalltalk",
            RouteTarget::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// The router's per-turn output. Ephemeral — logged, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDecision {
    pub target: RouteTarget,

    /// Share of keyword evidence the winning label collected, in `[0, 1]`
    pub confidence: f32,

    /// Short human-readable justification, for logs
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_matches_routing_rules() {
        assert!(RouteTarget::Negotiation.priority() > RouteTarget::Alerts.priority());
        assert!(RouteTarget::Alerts.priority() > RouteTarget::Search.priority());
        assert!(RouteTarget::Search.priority() > RouteTarget::Legal.priority());
        assert!(RouteTarget::Legal.priority() > RouteTarget::Smalltalk.priority());
    }

    #[test]
    fn target_display_is_snake_case() {
        assert_eq!(RouteTarget::Negotiation.to_string(), "negotiation");
        assert_eq!(RouteTarget::Unknown.to_string(), "unknown");
    }
}
