//! Knowledge Store Repository
//!
//! Full-text search over stored reference problems, used as the similarity
//! search behind the retriever. Results are ordered by FTS5 bm25 rank, then
//! by insertion order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::retrieval::VectorStore;

/// Repository of reference problems grouped into collections
#[derive(Clone)]
pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

impl SqliteKnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a document in a collection
    pub async fn insert(&self, collection: &str, content: &str) -> Result<()> {
        sqlx::query("INSERT INTO problems (collection, content) VALUES (?, ?)")
            .bind(collection)
            .bind(content)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert problem into '{}'", collection))?;
        Ok(())
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count problems")?;
        Ok(count)
    }

    /// Search a collection, best match first.
    pub async fn search(
        &self,
        collection: &str,
        query_text: &str,
        limit: i64,
    ) -> Result<Vec<String>> {
        let Some(match_expr) = fts_match_expression(query_text) else {
            return Ok(Vec::new());
        };

        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT content
            FROM problems
            WHERE problems MATCH ? AND collection = ?
            ORDER BY rank, rowid
            LIMIT ?
            "#,
        )
        .bind(match_expr)
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to execute FTS query on problems")?;

        Ok(rows)
    }
}

#[async_trait]
impl VectorStore for SqliteKnowledgeStore {
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        n_results: usize,
    ) -> Result<Vec<String>> {
        let limit = i64::try_from(n_results).unwrap_or(i64::MAX);
        self.search(collection, query_text, limit).await
    }
}

/// Turn free text into an FTS5 query: every alphanumeric term quoted, OR-ed.
///
/// Quoting keeps operators and punctuation in questions (`-`, `*`, `"`,
/// `AND`) from being parsed as FTS syntax. Returns `None` when the text
/// has no searchable terms.
fn fts_match_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}
