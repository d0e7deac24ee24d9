//! Tool adapter implementations for riad.
//!
//! These are the narrow request/response wrappers the agents call:
//! - **search** — the property catalog (`CatalogSearch`)
//! - **negotiation** — pure margin/counter-offer math
//! - **legal** — retrieval over the legal knowledge corpus
//! - **alerts** — alert persistence and the listing-ingestion matcher
//!
//! All adapters are stateless given their inputs; the catalog and alert
//! stores hold data behind `tokio` locks so tests and the CLI can run
//! fully in-process.

pub mod alerts;
pub mod legal;
pub mod negotiation;
pub mod search;

pub use alerts::{AlertMatcher, InMemoryAlertStore};
pub use legal::CorpusRetriever;
pub use negotiation::{OfferClass, classify_offer, margin_for, suggest_range};
pub use search::CatalogSearch;
