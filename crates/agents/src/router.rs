//! Keyword intent router.
//!
//! Classifies an inbound message over the fixed label set the supervisor
//! dispatches on. Each label owns a keyword list; the label with the most
//! evidence wins, equal scores break by the fixed priority order
//! (negotiation > alerts > search > legal > smalltalk), and a scattered
//! score profile falls to `Unknown`, which the supervisor turns into a
//! clarification reply. An attached image is strong evidence for search:
//! image similarity lookup is itself a search variant.

use riad_core::conversation::InboundMessage;
use riad_core::intent::{IntentDecision, RouteTarget};
use tracing::debug;

use crate::parse::{CITIES, PROPERTY_TYPES, count_mentions};

const NEGOTIATION_KEYWORDS: &[&str] = &[
    "négoc",
    "negoc",
    "offre",
    "contre-offre",
    "marchander",
    "remise",
    "rabais",
    "prix final",
    "baisser le prix",
    "je propose",
    "intéresse",
    "interesse",
];

const ALERTS_KEYWORDS: &[&str] = &[
    "alerte",
    "alertes",
    "alert",
    "préviens",
    "prévenir",
    "previens",
    "prevenir",
    "notifie",
    "notification",
    "abonne",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "cherche",
    "recherche",
    "trouve",
    "trouver",
    "louer",
    "location",
    "acheter",
    "achat",
    "budget",
    "chambre",
    "chambres",
    "bien",
    "biens",
];

pub(crate) const LEGAL_KEYWORDS: &[&str] = &[
    "loi",
    "lois",
    "juridique",
    "légal",
    "legal",
    "contrat",
    "notaire",
    "taxe",
    "taxes",
    "impôt",
    "impot",
    "bail",
    "procédure",
    "procedure",
    "droit",
    "droits",
    "copropriété",
    "copropriete",
    "vefa",
    "foncier",
    "héritage",
    "heritage",
    "hypothèque",
    "hypotheque",
];

const SMALLTALK_KEYWORDS: &[&str] = &[
    "bonjour",
    "salut",
    "bonsoir",
    "hello",
    "hey",
    "coucou",
    "merci",
    "au revoir",
    "ça va",
    "bonne journée",
];

/// Evidence weight an attached image adds to the search label.
const IMAGE_WEIGHT: usize = 2;

pub struct IntentRouter {
    min_confidence: f32,
}

impl IntentRouter {
    pub fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }

    /// Classify one inbound message. Pure: no conversation state, no I/O.
    pub fn classify(&self, message: &InboundMessage) -> IntentDecision {
        let text = &message.text;

        let mut search_score = count_mentions(text, SEARCH_KEYWORDS)
            + count_mentions(text, CITIES)
            + count_mentions(text, PROPERTY_TYPES);
        if message.image.is_some() {
            search_score += IMAGE_WEIGHT;
        }

        let scores = [
            (RouteTarget::Negotiation, count_mentions(text, NEGOTIATION_KEYWORDS)),
            (RouteTarget::Alerts, count_mentions(text, ALERTS_KEYWORDS)),
            (RouteTarget::Search, search_score),
            (RouteTarget::Legal, count_mentions(text, LEGAL_KEYWORDS)),
            (RouteTarget::Smalltalk, count_mentions(text, SMALLTALK_KEYWORDS)),
        ];

        let total: usize = scores.iter().map(|(_, s)| s).sum();
        let best = scores
            .iter()
            .max_by_key(|(target, score)| (*score, target.priority()))
            .copied()
            .unwrap_or((RouteTarget::Unknown, 0));

        if best.1 == 0 {
            return IntentDecision {
                target: RouteTarget::Unknown,
                confidence: 0.0,
                rationale: "no keyword evidence".into(),
            };
        }

        let confidence = best.1 as f32 / total as f32;
        let decision = if confidence < self.min_confidence {
            IntentDecision {
                target: RouteTarget::Unknown,
                confidence,
                rationale: format!(
                    "evidence scattered across labels (best {} at {confidence:.2})",
                    best.0
                ),
            }
        } else {
            IntentDecision {
                target: best.0,
                confidence,
                rationale: format!("{} keyword hit(s) for {}", best.1, best.0),
            }
        };

        debug!(
            target = %decision.target,
            confidence = decision.confidence,
            "Intent classified"
        );
        decision
    }
}
