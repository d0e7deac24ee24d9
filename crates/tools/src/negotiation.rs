//! Negotiation math — pure functions, no I/O.
//!
//! The seller side concedes a bounded discount below the asking price.
//! How much depends on the market: prime cities move fast (small margin),
//! villas carry a wider spread (large margin), everything else sits in
//! between. The suggested acceptable range is
//! `[asking × (1 − margin), asking]`.

use riad_config::NegotiationConfig;
use serde::{Deserialize, Serialize};

/// How an offer compares to the suggested range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferClass {
    /// Below the low bound — refuse
    Low,
    /// Inside the range but under asking — counter
    Fair,
    /// At or above asking — accept
    Strong,
}

/// Pick the margin for a listing given its location and property type.
pub fn margin_for(location: &str, property_type: &str, policy: &NegotiationConfig) -> f64 {
    let loc = location.to_lowercase();
    if policy.prime_cities.iter().any(|c| loc.contains(c.as_str())) {
        return policy.prime_city_margin;
    }
    if property_type.to_lowercase().contains("villa") {
        return policy.villa_margin;
    }
    policy.default_margin
}

/// The acceptable range for a listing: `(low, high)` with
/// `low = asking × (1 − margin)` and `high = asking`. Linear in the
/// asking price under a fixed margin.
pub fn suggest_range(asking_price: f64, margin: f64) -> (f64, f64) {
    (asking_price * (1.0 - margin), asking_price)
}

/// Classify an offer relative to the suggested range.
pub fn classify_offer(offer: f64, range: (f64, f64)) -> OfferClass {
    let (low, high) = range;
    if offer < low {
        OfferClass::Low
    } else if offer < high {
        OfferClass::Fair
    } else {
        OfferClass::Strong
    }
}

/// Counter-offer for a fair bid: meet in the middle between the offer
/// and the asking price.
pub fn counter_offer(offer: f64, asking_price: f64) -> f64 {
    (offer + asking_price) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NegotiationConfig {
        NegotiationConfig::default()
    }

    #[test]
    fn default_margin_applies_elsewhere() {
        let m = margin_for("Oujda", "appartement", &policy());
        assert_eq!(m, 0.07);
    }

    #[test]
    fn prime_city_margin_is_tighter() {
        let m = margin_for("Maârif, Casablanca", "appartement", &policy());
        assert_eq!(m, 0.05);
        let m = margin_for("Guéliz, Marrakech", "studio", &policy());
        assert_eq!(m, 0.05);
    }

    #[test]
    fn villa_margin_is_wider() {
        let m = margin_for("Tanger", "villa", &policy());
        assert_eq!(m, 0.10);
    }

    #[test]
    fn prime_city_wins_over_villa() {
        // A villa in Casablanca is still a prime-city listing
        let m = margin_for("Casablanca", "villa", &policy());
        assert_eq!(m, 0.05);
    }

    #[test]
    fn range_bounds() {
        let (low, high) = suggest_range(1_000_000.0, 0.07);
        assert_eq!(low, 930_000.0);
        assert_eq!(high, 1_000_000.0);
    }

    #[test]
    fn range_is_linear_in_asking_price() {
        let margin = 0.07;
        let (low1, high1) = suggest_range(500_000.0, margin);
        let (low2, high2) = suggest_range(1_000_000.0, margin);
        assert_eq!(low2, low1 * 2.0);
        assert_eq!(high2, high1 * 2.0);
    }

    #[test]
    fn offer_classification_boundaries() {
        let range = suggest_range(1_000_000.0, 0.07); // (930k, 1M)
        assert_eq!(classify_offer(900_000.0, range), OfferClass::Low);
        assert_eq!(classify_offer(930_000.0, range), OfferClass::Fair);
        assert_eq!(classify_offer(980_000.0, range), OfferClass::Fair);
        assert_eq!(classify_offer(1_000_000.0, range), OfferClass::Strong);
        assert_eq!(classify_offer(1_100_000.0, range), OfferClass::Strong);
    }

    #[test]
    fn counter_meets_in_the_middle() {
        assert_eq!(counter_offer(900_000.0, 1_000_000.0), 950_000.0);
    }
}
