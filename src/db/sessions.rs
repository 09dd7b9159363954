//! Interview session repository.
//!
//! Sessions are written by the interview flow and read back for history and
//! reporting. Listing is per-user, newest first.

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document, doc};
use mongodb::error::Result;

use super::Db;
use super::models::{InterviewSession, SessionStatus};

impl Db {
    pub async fn insert_session(&self, session: &InterviewSession) -> Result<ObjectId> {
        let result = self.sessions().insert_one(session).await?;
        Ok(result
            .inserted_id
            .as_object_id()
            .unwrap_or_else(ObjectId::new))
    }

    pub async fn get_session(&self, id: ObjectId) -> Result<Option<InterviewSession>> {
        self.sessions().find_one(doc! { "_id": id }).await
    }

    /// Sessions for a user (or all sessions), newest first.
    pub async fn list_sessions(&self, user: Option<ObjectId>) -> Result<Vec<InterviewSession>> {
        let filter = match user {
            Some(user_id) => doc! { "userId": user_id },
            None => Document::new(),
        };
        self.sessions()
            .find(filter)
            .sort(doc! { "startTime": -1 })
            .await?
            .try_collect()
            .await
    }

    /// Mark a session completed, stamping its end time and overall result.
    ///
    /// Returns `false` when no session matched the id.
    pub async fn complete_session(
        &self,
        id: ObjectId,
        overall_score: i32,
        overall_feedback: Option<String>,
    ) -> Result<bool> {
        let completed = mongodb::bson::ser::to_bson(&SessionStatus::Completed)?;
        let mut changes = doc! {
            "status": completed,
            "overallScore": overall_score,
            "endTime": DateTime::now(),
        };
        if let Some(feedback) = overall_feedback {
            changes.insert("overallFeedback", feedback);
        }
        let result = self
            .sessions()
            .update_one(doc! { "_id": id }, doc! { "$set": changes })
            .await?;
        Ok(result.matched_count > 0)
    }
}
