//! Keyword search over the question bank.
//!
//! Primary path is the `$text` index ranked by `textScore`. When that yields
//! nothing (or the index is unavailable, e.g. on a fresh collection), a
//! case-insensitive regex scan over the same fields keeps search usable.

use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::Result;
use tracing::debug;

use super::Db;
use super::models::Question;
use super::questions::{QuestionFilter, filter_document};

/// Regex fallback query over the text-indexed fields.
#[must_use]
pub fn regex_search_document(term: &str, filter: &QuestionFilter) -> Document {
    let pattern = regex::escape(term);
    let mut document = filter_document(filter);
    document.insert(
        "$or",
        vec![
            doc! { "question": { "$regex": &pattern, "$options": "i" } },
            doc! { "answer": { "$regex": &pattern, "$options": "i" } },
            doc! { "topics": { "$regex": &pattern, "$options": "i" } },
        ],
    );
    document
}

impl Db {
    /// Search questions by keyword, best match first.
    pub async fn search_questions(
        &self,
        term: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> Result<Vec<Question>> {
        match self.text_search(term, filter, limit).await {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => debug!("text search returned nothing for {term:?}, trying regex"),
            Err(err) => debug!("text search failed for {term:?} ({err}), trying regex"),
        }

        self.questions()
            .find(regex_search_document(term, filter))
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await
    }

    async fn text_search(
        &self,
        term: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> Result<Vec<Question>> {
        let mut query = filter_document(filter);
        query.insert("$text", doc! { "$search": term });

        self.questions()
            .find(query)
            .projection(doc! { "score": { "$meta": "textScore" } })
            .sort(doc! { "score": { "$meta": "textScore" } })
            .limit(limit)
            .await?
            .try_collect()
            .await
    }
}

// ── Tests ────────────────────────────────────────────────────────────
