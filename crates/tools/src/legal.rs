//! Legal knowledge retrieval adapter.
//!
//! `CorpusRetriever` holds pre-chunked passages from the legal document
//! corpus and scores them against a query by keyword overlap. Results
//! come back ordered by descending relevance; the legal agent applies
//! the confidence threshold.

use async_trait::async_trait;
use riad_core::adapter::{LegalRetrieval, ScoredPassage};
use riad_core::error::ToolError;
use tracing::debug;

/// One indexed passage.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub source: String,
}

impl Passage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// In-memory retrieval over a chunked legal corpus.
pub struct CorpusRetriever {
    passages: Vec<Passage>,
}

impl CorpusRetriever {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Keyword-overlap relevance in `[0, 1]`: the share of meaningful query
/// words found in the passage. Short function words are ignored so that
/// "quels sont les frais de notaire ?" scores on "frais" and "notaire",
/// not on "les".
fn relevance(query: &str, passage: &str) -> f32 {
    let passage_lower = passage.to_lowercase();
    let words: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        return 0.0;
    }

    let hits = words
        .iter()
        .filter(|w| passage_lower.contains(w.as_str()))
        .count();
    hits as f32 / words.len() as f32
}

#[async_trait]
impl LegalRetrieval for CorpusRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>, ToolError> {
        let mut scored: Vec<ScoredPassage> = self
            .passages
            .iter()
            .map(|p| ScoredPassage {
                text: p.text.clone(),
                source: p.source.clone(),
                score: relevance(query, &p.text),
            })
            .filter(|p| p.score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.source.cmp(&b.source))
        });
        scored.truncate(k);

        debug!(query, results = scored.len(), "Legal retrieval complete");
        Ok(scored)
    }
}
