//! Vector store abstraction for semantic question search.
//!
//! The store is an external service. Everything here is best-effort by
//! contract: callers must be prepared for [`VectorStoreError::Unavailable`]
//! and fall back to plain database search.

pub mod chroma;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur talking to the vector store service.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    #[error("vector store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected vector store response: {0}")]
    Protocol(String),

    #[error("vector store collection not initialized")]
    NotInitialized,
}

/// A question flattened into the shape the vector store ingests: one text
/// blob to embed plus the metadata used for filtered similarity queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    pub kind: String,
    pub category: String,
    pub difficulty: String,
    pub company: Option<String>,
}

/// Metadata constraints applied to a similarity query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub kind: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub company: Option<String>,
}

impl SearchFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.category.is_none()
            && self.difficulty.is_none()
            && self.company.is_none()
    }
}

/// A similarity hit: the stored record id and its score (higher is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    pub id: String,
    pub score: f64,
}

/// Interface to a vector store service.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Cheap liveness probe; used to decide whether semantic search is
    /// worth attempting at all.
    async fn heartbeat(&self) -> Result<(), VectorStoreError>;

    /// Prepare the backing collection. Idempotent.
    async fn initialize(&self) -> Result<(), VectorStoreError>;

    /// Upsert records into the collection; returns how many were written.
    async fn ingest(&self, records: &[QuestionRecord]) -> Result<usize, VectorStoreError>;

    /// Similarity search, best match first.
    async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredId>, VectorStoreError>;
}
