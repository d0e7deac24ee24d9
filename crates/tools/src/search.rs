//! Property catalog search adapter.
//!
//! `CatalogSearch` filters an in-memory catalog with the structured
//! criteria and returns results in a deterministic order: price
//! ascending, then recency descending, then id. Image queries rank by
//! token overlap against each listing's similarity token instead of
//! plain filtering.

use async_trait::async_trait;
use riad_core::adapter::PropertySearch;
use riad_core::error::ToolError;
use riad_core::listing::{ListingSummary, SearchCriteria};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory property catalog.
pub struct CatalogSearch {
    listings: Arc<RwLock<Vec<ListingSummary>>>,
}

impl CatalogSearch {
    pub fn new() -> Self {
        Self {
            listings: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_listings(listings: Vec<ListingSummary>) -> Self {
        Self {
            listings: Arc::new(RwLock::new(listings)),
        }
    }

    /// Add a listing to the catalog (the ingestion path).
    pub async fn insert(&self, listing: ListingSummary) {
        self.listings.write().await.push(listing);
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

impl Default for CatalogSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-overlap score between an image query token and a listing, in
/// `[0, 1]`. The token is a space-separated bag of visual descriptors
/// ("villa piscine moderne"); listings expose the same vocabulary via
/// `image_token` and their title.
fn similarity(query_token: &str, listing: &ListingSummary) -> f32 {
    let query: Vec<String> = query_token
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if query.is_empty() {
        return 0.0;
    }

    let mut target = listing.title.to_lowercase();
    if let Some(token) = &listing.image_token {
        target.push(' ');
        target.push_str(&token.to_lowercase());
    }
    target.push(' ');
    target.push_str(&listing.property_type.to_lowercase());

    let hits = query.iter().filter(|w| target.contains(w.as_str())).count();
    hits as f32 / query.len() as f32
}

#[async_trait]
impl PropertySearch for CatalogSearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ListingSummary>, ToolError> {
        let listings = self.listings.read().await;

        let mut results: Vec<ListingSummary> = if let Some(token) = &criteria.similar_to {
            // Image query: rank by similarity, keep matches above zero,
            // still honoring any explicit filters alongside.
            let mut scored: Vec<(f32, ListingSummary)> = listings
                .iter()
                .filter(|l| criteria.accepts(l))
                .map(|l| (similarity(token, l), l.clone()))
                .filter(|(score, _)| *score > 0.0)
                .collect();
            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1.ordering_key().cmp(&b.1.ordering_key()))
            });
            scored.into_iter().map(|(_, l)| l).collect()
        } else {
            let mut filtered: Vec<ListingSummary> = listings
                .iter()
                .filter(|l| criteria.accepts(l))
                .cloned()
                .collect();
            filtered.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
            filtered
        };

        debug!(
            count = results.len(),
            image = criteria.similar_to.is_some(),
            "Catalog search complete"
        );

        // The caller caps presentation; keep the adapter's own output
        // bounded too so huge catalogs don't flood the wire.
        results.truncate(50);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use riad_core::listing::{ListingId, TransactionKind};

    fn listing(id: &str, price: f64, days_old: i64) -> ListingSummary {
        ListingSummary {
            id: ListingId::from(id),
            title: format!("Appartement {id}"),
            location: "Casablanca".into(),
            price,
            transaction: TransactionKind::Sale,
            property_type: "appartement".into(),
            bedrooms: 2,
            surface: Some(90.0),
            image_token: None,
            posted_at: Utc::now() - Duration::days(days_old),
        }
    }

    #[tokio::test]
    async fn orders_by_price_ascending() {
        let catalog = CatalogSearch::with_listings(vec![
            listing("expensive", 900_000.0, 0),
            listing("cheap", 400_000.0, 0),
            listing("mid", 600_000.0, 0),
        ]);

        let results = catalog.search(&SearchCriteria::default()).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|l| l.id.0.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "mid", "expensive"]);
    }

    #[tokio::test]
    async fn equal_prices_break_by_recency() {
        let catalog = CatalogSearch::with_listings(vec![
            listing("old", 500_000.0, 30),
            listing("new", 500_000.0, 1),
        ]);

        let results = catalog.search(&SearchCriteria::default()).await.unwrap();
        assert_eq!(results[0].id.0, "new");
        assert_eq!(results[1].id.0, "old");
    }

    #[tokio::test]
    async fn ordering_is_reproducible() {
        let catalog = CatalogSearch::with_listings(vec![
            listing("a", 500_000.0, 3),
            listing("b", 400_000.0, 2),
            listing("c", 450_000.0, 1),
        ]);

        let first = catalog.search(&SearchCriteria::default()).await.unwrap();
        let second = catalog.search(&SearchCriteria::default()).await.unwrap();
        let ids =
            |v: &[ListingSummary]| v.iter().map(|l| l.id.0.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn filters_apply() {
        let mut cheap = listing("cheap", 300_000.0, 0);
        cheap.location = "Rabat".into();
        let catalog = CatalogSearch::with_listings(vec![cheap, listing("casa", 500_000.0, 0)]);

        let criteria = SearchCriteria {
            location: Some("casablanca".into()),
            ..Default::default()
        };
        let results = catalog.search(&criteria).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.0, "casa");
    }

    #[tokio::test]
    async fn image_query_ranks_by_overlap() {
        let mut villa = listing("villa", 2_000_000.0, 0);
        villa.title = "Villa avec piscine".into();
        villa.property_type = "villa".into();
        villa.image_token = Some("villa piscine jardin moderne".into());

        let mut flat = listing("flat", 400_000.0, 0);
        flat.image_token = Some("appartement balcon".into());

        let catalog = CatalogSearch::with_listings(vec![flat, villa]);

        let criteria = SearchCriteria {
            similar_to: Some("villa piscine".into()),
            ..Default::default()
        };
        let results = catalog.search(&criteria).await.unwrap();
        assert_eq!(results[0].id.0, "villa");
    }

    #[tokio::test]
    async fn image_query_with_no_overlap_is_empty() {
        let catalog = CatalogSearch::with_listings(vec![listing("a", 500_000.0, 0)]);
        let criteria = SearchCriteria {
            similar_to: Some("riad traditionnel zellige".into()),
            ..Default::default()
        };
        let results = catalog.search(&criteria).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn insert_extends_catalog() {
        let catalog = CatalogSearch::new();
        assert!(catalog.is_empty().await);
        catalog.insert(listing("a", 500_000.0, 0)).await;
        assert_eq!(catalog.len().await, 1);
    }
}
