//! Reference Retrieval
//!
//! Wraps the similarity-search collaborator. The tutor only ever asks one
//! question of it: "which stored problems in this subject look most like
//! this one?". Any failure to answer is treated as "none".

use async_trait::async_trait;
use std::sync::Arc;
use tutor_sdk::Subject;

pub mod memory;

pub use memory::InMemoryStore;

/// Number of references fetched per question when not configured otherwise
pub const DEFAULT_REFERENCE_COUNT: usize = 3;

/// Similarity search over stored problem texts
///
/// Implementations return at most `n_results` documents from `collection`,
/// most similar first. An unknown or empty collection yields an empty list.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        n_results: usize,
    ) -> anyhow::Result<Vec<String>>;
}

/// Subject-scoped adapter over a [`VectorStore`]
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    collection_prefix: String,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, collection_prefix: impl Into<String>) -> Self {
        Self {
            store,
            collection_prefix: collection_prefix.into(),
        }
    }

    /// Name of the collection holding problems for `subject`
    pub fn collection_for(&self, subject: Subject) -> String {
        collection_name(&self.collection_prefix, subject)
    }

    /// Fetch up to `k` reference texts similar to `question`.
    ///
    /// Never fails: a store error is logged and reported as no references,
    /// so solution generation can proceed from the question alone.
    pub async fn retrieve(&self, subject: Subject, question: &str, k: usize) -> Vec<String> {
        if k == 0 {
            return Vec::new();
        }

        let collection = self.collection_for(subject);
        match self.store.query(&collection, question, k).await {
            Ok(mut documents) => {
                documents.truncate(k);
                tracing::debug!(
                    "Retrieved {} reference(s) from '{}'",
                    documents.len(),
                    collection
                );
                documents
            }
            Err(e) => {
                tracing::warn!(
                    "Reference search in '{}' failed, continuing without references: {:#}",
                    collection,
                    e
                );
                Vec::new()
            }
        }
    }
}

/// Collection name for a subject, e.g. `stem_physics`
pub fn collection_name(prefix: &str, subject: Subject) -> String {
    format!("{}{}", prefix, subject.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn query(&self, _: &str, _: &str, _: usize) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("store offline")
        }
    }

    struct OverDeliveringStore;

    #[async_trait]
    impl VectorStore for OverDeliveringStore {
        async fn query(&self, _: &str, _: &str, _: usize) -> anyhow::Result<Vec<String>> {
            Ok((0..10).map(|i| format!("doc {}", i)).collect())
        }
    }

    #[test]
    fn test_collection_naming() {
        let retriever = Retriever::new(Arc::new(InMemoryStore::new()), "stem_");
        assert_eq!(retriever.collection_for(Subject::Physics), "stem_physics");
        assert_eq!(
            collection_name("kb-", Subject::Chemistry),
            "kb-chemistry"
        );
    }

    #[tokio::test]
    async fn test_empty_store_yields_no_references() {
        let retriever = Retriever::new(Arc::new(InMemoryStore::new()), "stem_");

        for subject in Subject::ALL {
            let references = retriever
                .retrieve(subject, "What is the derivative of x^2?", DEFAULT_REFERENCE_COUNT)
                .await;
            assert!(references.is_empty());
        }
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty() {
        let retriever = Retriever::new(Arc::new(FailingStore), "stem_");
        let references = retriever
            .retrieve(Subject::Mathematics, "Solve 3x + 7 = 22", 3)
            .await;
        assert!(references.is_empty());
    }

    #[tokio::test]
    async fn test_results_capped_at_k() {
        let retriever = Retriever::new(Arc::new(OverDeliveringStore), "stem_");
        let references = retriever.retrieve(Subject::Physics, "force", 3).await;
        assert_eq!(references, vec!["doc 0", "doc 1", "doc 2"]);

        let none = retriever.retrieve(Subject::Physics, "force", 0).await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_is_subject_scoped() {
        let store = Arc::new(InMemoryStore::new());
        store.add("stem_physics", "A car travels at 60 km/h for 2.5 hours");
        store.add("stem_chemistry", "Balance H2 + O2 -> H2O");

        let retriever = Retriever::new(store, "stem_");
        let physics = retriever
            .retrieve(Subject::Physics, "How far does a car travel?", 3)
            .await;
        assert_eq!(physics, vec!["A car travels at 60 km/h for 2.5 hours"]);

        let maths = retriever
            .retrieve(Subject::Mathematics, "How far does a car travel?", 3)
            .await;
        assert!(maths.is_empty());
    }
}
