//! ChromaDB REST client.
//!
//! Speaks the v1 HTTP API: heartbeat, get-or-create collection, add, query.
//! Embeddings are computed server-side by the collection's embedding
//! function; this client only ships documents and metadata. Every request is
//! bounded by the configured timeout so a wedged service degrades search
//! instead of hanging the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{QuestionRecord, ScoredId, SearchFilter, VectorStore, VectorStoreError};
use crate::config::VectorConfig;

pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    collection_id: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f64>>>,
}

impl ChromaStore {
    pub fn new(cfg: &VectorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            collection: cfg.collection.clone(),
            collection_id: RwLock::new(None),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.base_url)
    }

    async fn collection_id(&self) -> Result<String, VectorStoreError> {
        self.collection_id
            .read()
            .await
            .clone()
            .ok_or(VectorStoreError::NotInitialized)
    }
}

/// Flatten a record's filterable fields into Chroma metadata.
#[must_use]
pub fn record_metadata(record: &QuestionRecord) -> Value {
    let mut metadata = Map::new();
    metadata.insert("type".to_string(), record.kind.clone().into());
    metadata.insert("category".to_string(), record.category.clone().into());
    metadata.insert("difficulty".to_string(), record.difficulty.clone().into());
    if let Some(company) = &record.company {
        metadata.insert("company".to_string(), company.clone().into());
    }
    Value::Object(metadata)
}

/// Build the `where` clause for a filtered query, if any filter is set.
#[must_use]
pub fn build_where(filter: &SearchFilter) -> Option<Value> {
    let mut clauses = Vec::new();
    if let Some(kind) = &filter.kind {
        clauses.push(json!({ "type": kind }));
    }
    if let Some(category) = &filter.category {
        clauses.push(json!({ "category": category }));
    }
    if let Some(difficulty) = &filter.difficulty {
        clauses.push(json!({ "difficulty": difficulty }));
    }
    if let Some(company) = &filter.company {
        clauses.push(json!({ "company": company }));
    }
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn heartbeat(&self) -> Result<(), VectorStoreError> {
        let response = self
            .client
            .get(self.api("heartbeat"))
            .send()
            .await
            .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "heartbeat returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn initialize(&self) -> Result<(), VectorStoreError> {
        let response = self
            .client
            .post(self.api("collections"))
            .json(&json!({ "name": self.collection, "get_or_create": true }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Protocol(format!(
                "collection create returned {}",
                response.status()
            )));
        }
        let collection: CollectionResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::Protocol(e.to_string()))?;

        info!(
            "ChromaDB collection `{}` ready ({})",
            self.collection, collection.id
        );
        *self.collection_id.write().await = Some(collection.id);
        Ok(())
    }

    async fn ingest(&self, records: &[QuestionRecord]) -> Result<usize, VectorStoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let collection_id = self.collection_id().await?;

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let documents: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let metadatas: Vec<Value> = records.iter().map(record_metadata).collect();

        let response = self
            .client
            .post(self.api(&format!("collections/{collection_id}/add")))
            .json(&json!({
                "ids": ids,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Protocol(format!(
                "add returned {}",
                response.status()
            )));
        }

        debug!("Ingested {} records into ChromaDB", records.len());
        Ok(records.len())
    }

    async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredId>, VectorStoreError> {
        let collection_id = self.collection_id().await?;

        let mut body = json!({
            "query_texts": [query],
            "n_results": limit,
            "include": ["distances"],
        });
        if let Some(where_clause) = build_where(filter) {
            body["where"] = where_clause;
        }

        let response = self
            .client
            .post(self.api(&format!("collections/{collection_id}/query")))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Protocol(format!(
                "query returned {}",
                response.status()
            )));
        }
        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::Protocol(e.to_string()))?;

        let ids = result.ids.into_iter().next().unwrap_or_default();
        let distances = result
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| ScoredId {
                id,
                // Distance 0 is an exact hit; anything missing scores lowest
                score: distances.get(i).map_or(0.0, |d| 1.0 / (1.0 + d)),
            })
            .collect())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
