//! Alert criteria and records — "tell me when a matching listing appears".
//!
//! Criteria are created from a user request (usually after a search came
//! back empty), persist until the user cancels them, and are matched
//! against newly ingested listings by an external path. A matched alert
//! stays active: later listings may still match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::UserId;
use crate::listing::{ListingSummary, TransactionKind, text_matches};

/// Unique identifier for a stored alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A structured alert filter. Unspecified fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    /// Minimum bedroom count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
}

impl AlertCriteria {
    /// An alert needs at least a location or a price bound to be worth
    /// storing; anything looser would match the whole catalog.
    pub fn is_actionable(&self) -> bool {
        self.location.is_some() || self.min_price.is_some() || self.max_price.is_some()
    }

    /// A listing matches iff every specified field is equal/within bound.
    /// Unspecified fields match everything.
    pub fn matches(&self, listing: &ListingSummary) -> bool {
        if let Some(loc) = &self.location {
            if !text_matches(loc, &listing.location) && !text_matches(loc, &listing.title) {
                return false;
            }
        }
        if let Some(kind) = &self.property_type {
            if !text_matches(kind, &listing.property_type) && !text_matches(kind, &listing.title) {
                return false;
            }
        }
        if let Some(tx) = self.transaction {
            if listing.transaction != tx {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }
        if let Some(beds) = self.bedrooms {
            if listing.bedrooms < beds {
                return false;
            }
        }
        true
    }

    /// One-line human description used in confirmations and listings.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(kind) = &self.property_type {
            parts.push(format!("Type: {kind}"));
        }
        if let Some(tx) = self.transaction {
            parts.push(
                match tx {
                    TransactionKind::Rent => "Location",
                    TransactionKind::Sale => "Achat",
                }
                .to_string(),
            );
        }
        if let Some(loc) = &self.location {
            parts.push(format!("📍 {loc}"));
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let min = self.min_price.unwrap_or(0.0).round() as i64;
            let max = self
                .max_price
                .map(|p| format!("{}", p.round() as i64))
                .unwrap_or_else(|| "∞".into());
            parts.push(format!("💰 {min} - {max} MAD"));
        }
        if let Some(beds) = self.bedrooms {
            parts.push(format!("🛏️ {beds}+ ch"));
        }
        if parts.is_empty() {
            "Critères personnalisés".into()
        } else {
            parts.join(" | ")
        }
    }
}

/// A stored alert, keyed by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub owner: UserId,
    pub criteria: AlertCriteria,
    pub created_at: DateTime<Utc>,

    /// Notifications already sent for this alert
    pub notifications_sent: u32,

    /// Cap after which the matcher stops notifying (the alert itself
    /// stays active and listed)
    pub max_notifications: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingId;

    fn listing(price: f64, location: &str, bedrooms: u32) -> ListingSummary {
        ListingSummary {
            id: ListingId::from("l1"),
            title: "Appartement lumineux".into(),
            location: location.into(),
            price,
            transaction: TransactionKind::Rent,
            property_type: "appartement".into(),
            bedrooms,
            surface: None,
            image_token: None,
            posted_at: Utc::now(),
        }
    }

    #[test]
    fn empty_criteria_not_actionable() {
        assert!(!AlertCriteria::default().is_actionable());
    }

    #[test]
    fn location_alone_is_actionable() {
        let c = AlertCriteria {
            location: Some("Rabat".into()),
            ..Default::default()
        };
        assert!(c.is_actionable());
    }

    #[test]
    fn price_bound_alone_is_actionable() {
        let c = AlertCriteria {
            max_price: Some(8_000.0),
            ..Default::default()
        };
        assert!(c.is_actionable());
    }

    #[test]
    fn unspecified_fields_are_wildcards() {
        let c = AlertCriteria {
            location: Some("Casablanca".into()),
            ..Default::default()
        };
        assert!(c.matches(&listing(7_000.0, "Casablanca", 1)));
        assert!(c.matches(&listing(9_999_999.0, "Casablanca", 0)));
    }

    #[test]
    fn every_specified_field_must_match() {
        let c = AlertCriteria {
            location: Some("Casablanca".into()),
            max_price: Some(8_000.0),
            bedrooms: Some(2),
            ..Default::default()
        };
        assert!(c.matches(&listing(7_500.0, "Casablanca", 2)));
        assert!(!c.matches(&listing(8_500.0, "Casablanca", 2))); // price
        assert!(!c.matches(&listing(7_500.0, "Tanger", 2))); // location
        assert!(!c.matches(&listing(7_500.0, "Casablanca", 1))); // bedrooms
    }

    #[test]
    fn transaction_kind_must_equal() {
        let c = AlertCriteria {
            location: Some("Casablanca".into()),
            transaction: Some(TransactionKind::Sale),
            ..Default::default()
        };
        assert!(!c.matches(&listing(7_500.0, "Casablanca", 2)));
    }

    #[test]
    fn describe_mentions_all_set_fields() {
        let c = AlertCriteria {
            location: Some("Rabat".into()),
            property_type: Some("villa".into()),
            max_price: Some(2_000_000.0),
            bedrooms: Some(4),
            ..Default::default()
        };
        let desc = c.describe();
        assert!(desc.contains("Rabat"));
        assert!(desc.contains("villa"));
        assert!(desc.contains("2000000"));
        assert!(desc.contains("4+"));
    }
}
