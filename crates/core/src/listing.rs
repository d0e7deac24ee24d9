//! Listing domain types — what the property catalog returns.
//!
//! A `ListingSummary` is produced by the search adapter and is read-only
//! from the agents' point of view: agents reference listings by id, they
//! never mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a listing in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Rent,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Sale => write!(f, "vente"),
            TransactionKind::Rent => write!(f, "location"),
        }
    }
}

/// A single property as presented to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    /// Catalog identifier (never shown to the user, only positions are)
    pub id: ListingId,

    /// Short human-readable title
    pub title: String,

    /// City or neighborhood
    pub location: String,

    /// Asking price in MAD
    pub price: f64,

    /// Sale or rent
    pub transaction: TransactionKind,

    /// Property category (appartement, villa, studio, ...)
    pub property_type: String,

    /// Bedroom count
    pub bedrooms: u32,

    /// Surface in m², when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<f64>,

    /// Opaque similarity token derived from the listing's photos,
    /// matched against image-based queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_token: Option<String>,

    /// When the listing entered the catalog (recency tie-break in ordering)
    pub posted_at: DateTime<Utc>,
}

impl ListingSummary {
    /// Ordering key for deterministic search results:
    /// price ascending, then recency descending, then id.
    ///
    /// Stable ordering is what makes "the 2nd one" style follow-ups
    /// reproducible across identical queries.
    pub fn ordering_key(&self) -> (u64, i64, String) {
        // f64 price is non-negative in practice; quantize to centimes
        let price_key = (self.price * 100.0).round() as u64;
        (price_key, -self.posted_at.timestamp(), self.id.0.clone())
    }
}

/// A structured property query. All fields optional; unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
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

    /// Image-similarity token; when set, the search ranks by token overlap
    /// instead of plain filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_to: Option<String>,
}

impl SearchCriteria {
    /// Whether any constraint at all was expressed.
    pub fn is_empty(&self) -> bool {
        *self == SearchCriteria::default()
    }

    /// Field-wise filter: every specified field must match, unspecified
    /// fields are wildcards. Text fields match case-insensitively by
    /// substring in either direction ("Casa" finds "Casablanca" and the
    /// catalog's "Maârif, Casablanca" finds a "casablanca" query).
    pub fn accepts(&self, listing: &ListingSummary) -> bool {
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
}

/// Case-insensitive substring match in either direction.
pub fn text_matches(needle: &str, haystack: &str) -> bool {
    let n = needle.to_lowercase();
    let h = haystack.to_lowercase();
    h.contains(&n) || n.contains(&h)
}

/// Format a MAD amount with thin-space thousands separators, the way the
/// transport-facing replies present prices ("850 000 MAD").
pub fn format_price(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{grouped} MAD")
    } else {
        format!("{grouped} MAD")
    }
}
