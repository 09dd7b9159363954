//! Document schemas for the question bank and interview sessions.
//!
//! Validation mirrors what the database layer enforces on every insert and
//! update: required fields must be present and non-empty, and the enumerated
//! fields must carry one of their allowed values. Violations surface as a
//! [`ValidationError`] naming the offending field(s).

use std::fmt;
use std::str::FromStr;

use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Validation errors ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value `{value}` for field `{field}` (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ── Enumerated fields ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    Technical,
    Behavioral,
    SystemDesign,
}

impl QuestionType {
    pub const EXPECTED: &'static str = "technical, behavioral, system-design";

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Behavioral => "behavioral",
            Self::SystemDesign => "system-design",
        }
    }
}

impl FromStr for QuestionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(Self::Technical),
            "behavioral" => Ok(Self::Behavioral),
            "system-design" => Ok(Self::SystemDesign),
            other => Err(ValidationError::InvalidValue {
                field: "type",
                value: other.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const EXPECTED: &'static str = "easy, medium, hard";

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ValidationError::InvalidValue {
                field: "difficulty",
                value: other.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Question ─────────────────────────────────────────────────────────

/// A question-bank entry as persisted in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub question: String,
    pub answer: String,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    pub category: String,
    pub difficulty: Difficulty,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    pub created_at: DateTime,
    pub updated_at: DateTime,

    /// Weak reference to the creating user; identifier only, no ownership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ObjectId>,
}

/// Raw insert/update payload for a question, before validation.
///
/// The enumerated fields arrive as plain strings so a bad value is reported
/// as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub answer: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub difficulty: String,

    #[serde(default)]
    pub company: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default)]
    pub created_by: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into a persistable [`Question`].
    ///
    /// All missing required fields are reported together; enum violations are
    /// reported per field. `topics` defaults to empty and carries no
    /// uniqueness constraint. Creation and update timestamps are stamped here.
    pub fn validate(self) -> Result<Question, ValidationError> {
        let mut missing = Vec::new();
        if self.question.trim().is_empty() {
            missing.push("question");
        }
        if self.answer.trim().is_empty() {
            missing.push("answer");
        }
        if self.kind.trim().is_empty() {
            missing.push("type");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.difficulty.trim().is_empty() {
            missing.push("difficulty");
        }
        if !missing.is_empty() {
            return Err(ValidationError::Missing(missing));
        }

        let kind = self.kind.parse::<QuestionType>()?;
        let difficulty = self.difficulty.parse::<Difficulty>()?;

        let created_by = match self.created_by.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(ObjectId::parse_str(raw).map_err(|_| {
                ValidationError::InvalidValue {
                    field: "createdBy",
                    value: raw.to_string(),
                    expected: "a 24-character hex object id",
                }
            })?),
            None => None,
        };

        let now = DateTime::now();
        Ok(Question {
            id: None,
            question: self.question,
            answer: self.answer,
            kind,
            category: self.category,
            difficulty,
            company: self.company.filter(|c| !c.trim().is_empty()),
            topics: self.topics,
            created_at: now,
            updated_at: now,
            created_by,
        })
    }
}

// ── Interview sessions ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResponseScores {
    #[serde(default)]
    pub technical: i32,
    #[serde(default)]
    pub communication: i32,
}

/// A single answered question within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub question: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    #[serde(default)]
    pub scores: ResponseScores,

    #[serde(default)]
    pub response_time: i64,
}

/// A recorded mock-interview run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub interview_type: InterviewType,
    pub role: String,
    pub seniority: Seniority,

    #[serde(default)]
    pub duration: i64,

    #[serde(default)]
    pub focus: Vec<String>,

    pub difficulty: Difficulty,

    #[serde(default)]
    pub responses: Vec<SessionResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_feedback: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<i32>,

    pub status: SessionStatus,
    pub start_time: DateTime,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAverages {
    pub avg_technical_score: i32,
    pub avg_communication_score: i32,
}

impl InterviewSession {
    /// Average per-response scores, ignoring unscored (zero) entries.
    #[must_use]
    pub fn score_averages(&self) -> SessionAverages {
        fn avg(values: impl Iterator<Item = i32>) -> i32 {
            let scored: Vec<i32> = values.filter(|v| *v > 0).collect();
            if scored.is_empty() {
                return 0;
            }
            let sum: i64 = scored.iter().map(|v| i64::from(*v)).sum();
            // Round half up, matching integer score display
            ((sum as f64 / scored.len() as f64) + 0.5) as i32
        }

        SessionAverages {
            avg_technical_score: avg(self.responses.iter().map(|r| r.scores.technical)),
            avg_communication_score: avg(self.responses.iter().map(|r| r.scores.communication)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> QuestionDraft {
        QuestionDraft {
            question: "What is ownership in Rust?".to_string(),
            answer: "A set of rules governing how memory is managed.".to_string(),
            kind: "technical".to_string(),
            category: "rust".to_string(),
            difficulty: "medium".to_string(),
            ..QuestionDraft::default()
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        let question = valid_draft().validate().unwrap();
        assert_eq!(question.kind, QuestionType::Technical);
        assert_eq!(question.difficulty, Difficulty::Medium);
        assert!(question.id.is_none());
        assert!(question.created_by.is_none());
        assert_eq!(question.created_at, question.updated_at);
    }

    #[test]
    fn test_topics_default_to_empty() {
        let question = valid_draft().validate().unwrap();
        assert!(question.topics.is_empty());
    }

    #[test]
    fn test_missing_fields_are_all_named() {
        let draft = QuestionDraft {
            question: "Only the question is present".to_string(),
            ..QuestionDraft::default()
        };
        let err = draft.validate().unwrap_err();
        match err {
            ValidationError::Missing(fields) => {
                assert_eq!(fields, vec!["answer", "type", "category", "difficulty"]);
            }
            other => panic!("expected Missing, got {other:?}"),
        }
        // The message names every offending field
        let draft = QuestionDraft::default();
        let msg = draft.validate().unwrap_err().to_string();
        for field in ["question", "answer", "type", "category", "difficulty"] {
            assert!(msg.contains(field), "message should name {field}: {msg}");
        }
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut draft = valid_draft();
        draft.answer = "   ".to_string();
        let err = draft.validate().unwrap_err();
        assert_eq!(err, ValidationError::Missing(vec!["answer"]));
    }

    #[test]
    fn test_invalid_type_rejected() {
        let mut draft = valid_draft();
        draft.kind = "trivia".to_string();
        let err = draft.validate().unwrap_err();
        match err {
            ValidationError::InvalidValue { field, value, .. } => {
                assert_eq!(field, "type");
                assert_eq!(value, "trivia");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_difficulty_rejected() {
        let mut draft = valid_draft();
        draft.difficulty = "impossible".to_string();
        let err = draft.validate().unwrap_err();
        match err {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "difficulty"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_created_by_parses_object_id() {
        let mut draft = valid_draft();
        let oid = ObjectId::new();
        draft.created_by = Some(oid.to_hex());
        let question = draft.validate().unwrap();
        assert_eq!(question.created_by, Some(oid));

        let mut draft = valid_draft();
        draft.created_by = Some("not-an-id".to_string());
        let err = draft.validate().unwrap_err();
        match err {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "createdBy"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(
            "system-design".parse::<QuestionType>().unwrap(),
            QuestionType::SystemDesign
        );
        assert_eq!(QuestionType::SystemDesign.to_string(), "system-design");
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("HARD".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_question_bson_field_names() {
        let question = valid_draft().validate().unwrap();
        let doc = mongodb::bson::to_document(&question).unwrap();
        assert!(doc.contains_key("type"));
        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("updatedAt"));
        assert_eq!(doc.get_str("difficulty").unwrap(), "medium");
        // Unset optional fields are omitted entirely
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("company"));
    }

    #[test]
    fn test_score_averages_ignore_unscored() {
        let session = InterviewSession {
            id: None,
            user_id: ObjectId::new(),
            interview_type: InterviewType::Mixed,
            role: "backend engineer".to_string(),
            seniority: Seniority::Mid,
            duration: 0,
            focus: vec![],
            difficulty: Difficulty::Medium,
            responses: vec![
                SessionResponse {
                    question: "q1".to_string(),
                    response: None,
                    feedback: None,
                    scores: ResponseScores {
                        technical: 80,
                        communication: 70,
                    },
                    response_time: 0,
                },
                SessionResponse {
                    question: "q2".to_string(),
                    response: None,
                    feedback: None,
                    scores: ResponseScores {
                        technical: 90,
                        communication: 0,
                    },
                    response_time: 0,
                },
            ],
            overall_feedback: None,
            overall_score: None,
            status: SessionStatus::InProgress,
            start_time: DateTime::now(),
            end_time: None,
        };

        let averages = session.score_averages();
        assert_eq!(averages.avg_technical_score, 85);
        // The zero communication score is treated as unscored
        assert_eq!(averages.avg_communication_score, 70);
    }

    #[test]
    fn test_score_averages_empty_session() {
        let session = InterviewSession {
            id: None,
            user_id: ObjectId::new(),
            interview_type: InterviewType::Technical,
            role: "analyst".to_string(),
            seniority: Seniority::Junior,
            duration: 0,
            focus: vec![],
            difficulty: Difficulty::Easy,
            responses: vec![],
            overall_feedback: None,
            overall_score: None,
            status: SessionStatus::InProgress,
            start_time: DateTime::now(),
            end_time: None,
        };
        assert_eq!(session.score_averages(), SessionAverages::default());
    }
}
