//! Question-bank repository: CRUD, filterable listing, and id hydration.

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document, doc};
use mongodb::error::Result;

use super::Db;
use super::models::{Difficulty, Question, QuestionType};

/// Filterable fields for question listing and search.
#[derive(Debug, Default, Clone)]
pub struct QuestionFilter {
    pub kind: Option<QuestionType>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub company: Option<String>,
    pub topic: Option<String>,
}

impl QuestionFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.category.is_none()
            && self.difficulty.is_none()
            && self.company.is_none()
            && self.topic.is_none()
    }
}

/// Translate a [`QuestionFilter`] into a MongoDB filter document.
///
/// Category and topic are exact matches; company is a case-insensitive
/// substring match since payloads are inconsistent about casing.
#[must_use]
pub fn filter_document(filter: &QuestionFilter) -> Document {
    let mut document = Document::new();
    if let Some(kind) = filter.kind {
        document.insert("type", kind.as_str());
    }
    if let Some(category) = &filter.category {
        document.insert("category", category);
    }
    if let Some(difficulty) = filter.difficulty {
        document.insert("difficulty", difficulty.as_str());
    }
    if let Some(company) = &filter.company {
        document.insert(
            "company",
            doc! { "$regex": regex::escape(company), "$options": "i" },
        );
    }
    if let Some(topic) = &filter.topic {
        // Matching a scalar against an array field matches any element
        document.insert("topics", topic);
    }
    document
}

impl Db {
    /// Insert an already-validated question; returns its new id.
    pub async fn insert_question(&self, question: &Question) -> Result<ObjectId> {
        let result = self.questions().insert_one(question).await?;
        Ok(result
            .inserted_id
            .as_object_id()
            .unwrap_or_else(ObjectId::new))
    }

    pub async fn get_question(&self, id: ObjectId) -> Result<Option<Question>> {
        self.questions().find_one(doc! { "_id": id }).await
    }

    /// List questions newest-first with pagination.
    pub async fn list_questions(
        &self,
        filter: &QuestionFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Question>> {
        self.questions()
            .find(filter_document(filter))
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await
    }

    pub async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64> {
        self.questions()
            .count_documents(filter_document(filter))
            .await
    }

    /// Every question in the bank, for vector-store synchronization.
    pub async fn list_all_questions(&self) -> Result<Vec<Question>> {
        self.questions()
            .find(Document::new())
            .await?
            .try_collect()
            .await
    }

    /// Fetch questions by id, preserving the order of `ids`.
    ///
    /// Used to hydrate semantic-search hits: the vector store ranks, MongoDB
    /// supplies the documents. Ids with no matching document are dropped.
    pub async fn find_questions_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<Question> = self
            .questions()
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;

        let mut ordered = Vec::with_capacity(found.len());
        for id in ids {
            if let Some(question) = found.iter().find(|q| q.id.as_ref() == Some(id)) {
                ordered.push(question.clone());
            }
        }
        Ok(ordered)
    }

    /// Apply a partial update and re-stamp `updatedAt`.
    ///
    /// Returns `false` when no question matched the id.
    pub async fn update_question(&self, id: ObjectId, mut changes: Document) -> Result<bool> {
        changes.insert("updatedAt", DateTime::now());
        let result = self
            .questions()
            .update_one(doc! { "_id": id }, doc! { "$set": changes })
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_question(&self, id: ObjectId) -> Result<bool> {
        let result = self.questions().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
