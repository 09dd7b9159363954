//! Question synchronization into the vector store.
//!
//! Runs at startup (best-effort) and on demand via the `sync` subcommand.
//! The whole bank is re-ingested each time; the store upserts by id, so the
//! operation is idempotent.

use anyhow::{Context, Result};
use tracing::info;

use crate::db::Db;
use crate::db::models::Question;
use crate::vector::{QuestionRecord, VectorStore};

/// Flatten a question into the record shape the vector store ingests.
///
/// Returns `None` for unsaved questions (no id): without a stable id the
/// record could never be hydrated back from MongoDB.
#[must_use]
pub fn question_record(question: &Question) -> Option<QuestionRecord> {
    let id = question.id?;
    let mut text = format!("{}\n{}", question.question, question.answer);
    if !question.topics.is_empty() {
        text.push('\n');
        text.push_str(&question.topics.join(", "));
    }
    Some(QuestionRecord {
        id: id.to_hex(),
        text,
        kind: question.kind.to_string(),
        category: question.category.clone(),
        difficulty: question.difficulty.to_string(),
        company: question.company.clone(),
    })
}

/// Ingest a batch of questions; returns how many records were written.
pub async fn ingest_questions(
    questions: &[Question],
    store: &dyn VectorStore,
) -> Result<usize> {
    let records: Vec<QuestionRecord> = questions.iter().filter_map(question_record).collect();
    if records.is_empty() {
        return Ok(0);
    }
    store
        .ingest(&records)
        .await
        .context("vector store ingest failed")
}

/// Synchronize the entire question bank into the vector store.
///
/// Checks service liveness itself so it stays independent of whether the
/// initialization step succeeded earlier in startup.
pub async fn sync_questions(db: &Db, store: &dyn VectorStore) -> Result<usize> {
    store
        .heartbeat()
        .await
        .context("vector store unavailable")?;

    let questions = db
        .list_all_questions()
        .await
        .context("failed to load questions for sync")?;

    let count = ingest_questions(&questions, store).await?;
    info!("Synchronized {count} questions to the vector store");
    Ok(count)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::QuestionDraft;
    use crate::vector::mock::MockVectorStore;
    use mongodb::bson::oid::ObjectId;

    fn saved_question(question: &str, topics: &[&str]) -> Question {
        let mut q = QuestionDraft {
            question: question.to_string(),
            answer: "An answer.".to_string(),
            kind: "technical".to_string(),
            category: "general".to_string(),
            difficulty: "easy".to_string(),
            topics: topics.iter().map(ToString::to_string).collect(),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap();
        q.id = Some(ObjectId::new());
        q
    }

    #[test]
    fn test_record_mapping() {
        let question = saved_question("What is TCP?", &["networking", "protocols"]);
        let record = question_record(&question).unwrap();
        assert_eq!(record.id, question.id.unwrap().to_hex());
        assert!(record.text.contains("What is TCP?"));
        assert!(record.text.contains("networking, protocols"));
        assert_eq!(record.kind, "technical");
        assert_eq!(record.difficulty, "easy");
    }

    #[test]
    fn test_unsaved_question_produces_no_record() {
        let mut question = saved_question("No id yet", &[]);
        question.id = None;
        assert!(question_record(&question).is_none());
    }

    #[tokio::test]
    async fn test_ingest_questions_counts_records() {
        let store = MockVectorStore::new();
        let questions = vec![
            saved_question("What is TCP?", &[]),
            saved_question("What is UDP?", &[]),
        ];
        let count = ingest_questions(&questions, &store).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_empty_batch_is_noop() {
        let store = MockVectorStore::new();
        let count = ingest_questions(&[], &store).await.unwrap();
        assert_eq!(count, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_surfaces_store_failure() {
        let store = MockVectorStore::failing();
        let questions = vec![saved_question("Will not make it", &[])];
        assert!(ingest_questions(&questions, &store).await.is_err());
    }
}
