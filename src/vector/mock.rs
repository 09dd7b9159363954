//! Mock vector store for testing purposes.
//!
//! Scores by deterministic token overlap instead of real embeddings, so
//! tests can assert ranking without a running service. A store constructed
//! with [`MockVectorStore::failing`] refuses every call, which is how tests
//! exercise degraded-search behavior.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{QuestionRecord, ScoredId, SearchFilter, VectorStore, VectorStoreError};

#[derive(Default)]
pub struct MockVectorStore {
    records: Mutex<Vec<QuestionRecord>>,
    initialized: AtomicBool,
    fail: bool,
}

impl MockVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where every operation fails with `Unavailable`.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().expect("mock store poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), VectorStoreError> {
        if self.fail {
            return Err(VectorStoreError::Unavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_filter(record: &QuestionRecord, filter: &SearchFilter) -> bool {
    filter.kind.as_deref().is_none_or(|k| k == record.kind)
        && filter
            .category
            .as_deref()
            .is_none_or(|c| c == record.category)
        && filter
            .difficulty
            .as_deref()
            .is_none_or(|d| d == record.difficulty)
        && filter
            .company
            .as_deref()
            .is_none_or(|c| record.company.as_deref() == Some(c))
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn heartbeat(&self) -> Result<(), VectorStoreError> {
        self.check_available()
    }

    async fn initialize(&self) -> Result<(), VectorStoreError> {
        self.check_available()?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn ingest(&self, records: &[QuestionRecord]) -> Result<usize, VectorStoreError> {
        self.check_available()?;
        let mut stored = self.records.lock().expect("mock store poisoned");
        for record in records {
            // Upsert by id
            stored.retain(|existing| existing.id != record.id);
            stored.push(record.clone());
        }
        Ok(records.len())
    }

    async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredId>, VectorStoreError> {
        self.check_available()?;
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.records.lock().expect("mock store poisoned");
        let mut hits: Vec<ScoredId> = stored
            .iter()
            .filter(|record| matches_filter(record, filter))
            .filter_map(|record| {
                let record_tokens = tokenize(&record.text);
                let shared = query_tokens
                    .iter()
                    .filter(|t| record_tokens.contains(t))
                    .count();
                (shared > 0).then(|| ScoredId {
                    id: record.id.clone(),
                    score: shared as f64 / query_tokens.len() as f64,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str, kind: &str) -> QuestionRecord {
        QuestionRecord {
            id: id.to_string(),
            text: text.to_string(),
            kind: kind.to_string(),
            category: "general".to_string(),
            difficulty: "medium".to_string(),
            company: None,
        }
    }

    #[tokio::test]
    async fn test_ingest_upserts_by_id() {
        let store = MockVectorStore::new();
        store.initialize().await.unwrap();

        let count = store
            .ingest(&[record("a", "first", "technical")])
            .await
            .unwrap();
        assert_eq!(count, 1);

        store
            .ingest(&[record("a", "replaced", "technical")])
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_best_overlap_first() {
        let store = MockVectorStore::new();
        store
            .ingest(&[
                record("a", "binary search trees and traversal", "technical"),
                record("b", "binary protocols on the wire", "technical"),
                record("c", "team conflict resolution", "behavioral"),
            ])
            .await
            .unwrap();

        let hits = store
            .search("binary search", &SearchFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_applies_filter() {
        let store = MockVectorStore::new();
        store
            .ingest(&[
                record("a", "tell me about conflict", "behavioral"),
                record("b", "resolve a merge conflict", "technical"),
            ])
            .await
            .unwrap();

        let filter = SearchFilter {
            kind: Some("behavioral".to_string()),
            ..SearchFilter::default()
        };
        let hits = store.search("conflict", &filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_failing_store_refuses_everything() {
        let store = MockVectorStore::failing();
        assert!(matches!(
            store.heartbeat().await,
            Err(VectorStoreError::Unavailable(_))
        ));
        assert!(store.initialize().await.is_err());
        assert!(store.ingest(&[]).await.is_err());
        assert!(
            store
                .search("anything", &SearchFilter::default(), 5)
                .await
                .is_err()
        );
    }
}
