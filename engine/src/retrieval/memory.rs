//! In-process knowledge store
//!
//! Ranks documents by cosine similarity of term-frequency vectors. Good
//! enough for tests, demos and small seeded collections; nothing is
//! persisted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::VectorStore;

/// Collections of documents held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to a collection, creating it if needed
    pub fn add(&self, collection: &str, document: impl Into<String>) {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.into());
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        n_results: usize,
    ) -> anyhow::Result<Vec<String>> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let query_vector = term_frequencies(query_text);
        let mut scored: Vec<(f64, &String)> = documents
            .iter()
            .map(|doc| (cosine_similarity(&query_vector, &term_frequencies(doc)), doc))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(n_results)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// Lowercased alphanumeric terms and their counts
fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut frequencies = HashMap::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *frequencies.entry(term.to_lowercase()).or_insert(0.0) += 1.0;
    }
    frequencies
}

fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
