//! Route handlers for the question bank and interview sessions.
//!
//! The question-bank listing prefers semantic search when a search term is
//! present and the vector store answers its heartbeat; any failure on that
//! path falls back to plain database search, so the endpoint works the same
//! (minus ranking quality) with the vector service down.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AppState;
use crate::db::models::{
    InterviewSession, Question, SessionAverages, SessionResponse, ValidationError,
};
use crate::db::questions::QuestionFilter;
use crate::ingest;
use crate::vector::SearchFilter;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// How many matches to pull before paginating a search result in memory.
const SEARCH_CANDIDATE_LIMIT: i64 = 200;

/// A search term shorter than this is treated as a filter-only listing.
const MIN_SEARCH_LEN: usize = 3;

// ── Error responses ──────────────────────────────────────────────────

/// API error that renders as a JSON body with a machine-readable code.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        error!("database error: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: "database operation failed".to_string(),
        }
    }
}

fn parse_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid id: {raw}")))
}

// ── DTOs ─────────────────────────────────────────────────────────────

/// Question as rendered to API clients: hex id, RFC 3339 timestamps.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub difficulty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub topics: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl From<&Question> for QuestionDto {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.map(|id| id.to_hex()).unwrap_or_default(),
            question: question.question.clone(),
            answer: question.answer.clone(),
            kind: question.kind.to_string(),
            category: question.category.clone(),
            difficulty: question.difficulty.to_string(),
            company: question.company.clone(),
            topics: question.topics.clone(),
            created_at: question
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
            created_by: question.created_by.map(|id| id.to_hex()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: i64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBankResponse {
    pub success: bool,
    pub questions: Vec<QuestionDto>,
    pub semantic_search: bool,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryDto {
    pub id: String,
    pub interview_type: InterviewTypeDto,
    pub role: String,
    pub status: StatusDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<i32>,
    pub response_count: usize,
    pub start_time: String,
}

// Session enums serialize the same in storage and transport
type InterviewTypeDto = crate::db::models::InterviewType;
type StatusDto = crate::db::models::SessionStatus;

impl From<&InterviewSession> for SessionSummaryDto {
    fn from(session: &InterviewSession) -> Self {
        Self {
            id: session.id.map(|id| id.to_hex()).unwrap_or_default(),
            interview_type: session.interview_type,
            role: session.role.clone(),
            status: session.status,
            overall_score: session.overall_score,
            response_count: session.responses.len(),
            start_time: session
                .start_time
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: SessionSummaryDto,
    pub responses: Vec<SessionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_feedback: Option<String>,
    pub averages: SessionAverages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

// ── Pagination helpers ───────────────────────────────────────────────

fn paginate<T>(items: Vec<T>, page: u64, limit: i64) -> Vec<T> {
    let skip = (page.saturating_sub(1)) as usize * limit as usize;
    items.into_iter().skip(skip).take(limit as usize).collect()
}

fn page_count(total: u64, limit: i64) -> u64 {
    total.div_ceil(limit as u64)
}

// ── GET /health ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── GET /api/v1/interview/question-bank ──────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBankQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub company: Option<String>,
    pub topic: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

impl QuestionBankQuery {
    fn to_filter(&self) -> Result<QuestionFilter, ValidationError> {
        Ok(QuestionFilter {
            kind: self.kind.as_deref().map(str::parse).transpose()?,
            category: self.category.clone().filter(|c| c != "all"),
            difficulty: self.difficulty.as_deref().map(str::parse).transpose()?,
            company: self.company.clone(),
            topic: self.topic.clone(),
        })
    }
}

fn vector_filter(filter: &QuestionFilter) -> SearchFilter {
    SearchFilter {
        kind: filter.kind.map(|k| k.to_string()),
        category: filter.category.clone(),
        difficulty: filter.difficulty.map(|d| d.to_string()),
        company: filter.company.clone(),
    }
}

pub async fn question_bank(
    State(state): State<AppState>,
    Query(params): Query<QuestionBankQuery>,
) -> Result<Json<QuestionBankResponse>, ApiError> {
    let filter = params.to_filter()?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let term = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| t.len() >= MIN_SEARCH_LEN);

    if let Some(term) = term {
        if state.config.vector.enabled {
            match semantic_lookup(&state, term, &filter, page, limit).await {
                Ok(Some(response)) => return Ok(Json(response)),
                Ok(None) => {}
                Err(err) => warn!("semantic search failed, falling back: {err:#}"),
            }
        }
    }

    // Standard database path
    let (questions, total) = match term {
        Some(term) => {
            let matches = state
                .db
                .search_questions(term, &filter, SEARCH_CANDIDATE_LIMIT)
                .await?;
            let total = matches.len() as u64;
            (paginate(matches, page, limit), total)
        }
        None => {
            let total = state.db.count_questions(&filter).await?;
            let skip = (page - 1) * limit as u64;
            (state.db.list_questions(&filter, skip, limit).await?, total)
        }
    };

    Ok(Json(QuestionBankResponse {
        success: true,
        questions: questions.iter().map(QuestionDto::from).collect(),
        semantic_search: false,
        pagination: Pagination {
            total,
            page,
            limit,
            pages: page_count(total, limit),
        },
    }))
}

/// Semantic path: heartbeat, rank in the vector store, hydrate from MongoDB
/// preserving rank order. `Ok(None)` means "nothing usable, fall back".
async fn semantic_lookup(
    state: &AppState,
    term: &str,
    filter: &QuestionFilter,
    page: u64,
    limit: i64,
) -> anyhow::Result<Option<QuestionBankResponse>> {
    state.vector.heartbeat().await?;

    let candidates = (limit as usize * 2).max(20);
    let hits = state
        .vector
        .search(term, &vector_filter(filter), candidates)
        .await?;
    if hits.is_empty() {
        return Ok(None);
    }

    let ids: Vec<ObjectId> = hits
        .iter()
        .filter_map(|hit| ObjectId::parse_str(&hit.id).ok())
        .collect();
    let questions = state.db.find_questions_by_ids(&ids).await?;
    if questions.is_empty() {
        // Stale vector entries with no backing documents
        return Ok(None);
    }

    let total = questions.len() as u64;
    let selected = paginate(questions, page, limit);

    Ok(Some(QuestionBankResponse {
        success: true,
        questions: selected.iter().map(QuestionDto::from).collect(),
        semantic_search: true,
        pagination: Pagination {
            total,
            page,
            limit,
            pages: page_count(total, limit),
        },
    }))
}

// ── POST /api/v1/interview/question-bank/add ─────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionResponse {
    pub success: bool,
    pub question: QuestionDto,
}

pub async fn add_question(
    State(state): State<AppState>,
    Json(draft): Json<crate::db::models::QuestionDraft>,
) -> Result<(StatusCode, Json<AddQuestionResponse>), ApiError> {
    let mut question = draft.validate()?;
    let id = state.db.insert_question(&question).await?;
    question.id = Some(id);

    // Keep the vector store current; search still works (degraded) if not
    if state.config.vector.enabled {
        if let Err(err) =
            ingest::ingest_questions(std::slice::from_ref(&question), state.vector.as_ref()).await
        {
            warn!("vector ingest for new question failed: {err:#}");
        }
    }

    state.events.publish(
        "question-added",
        serde_json::json!({
            "id": id.to_hex(),
            "category": question.category,
            "type": question.kind.to_string(),
        }),
    );

    Ok((
        StatusCode::CREATED,
        Json(AddQuestionResponse {
            success: true,
            question: QuestionDto::from(&question),
        }),
    ))
}

// ── GET/DELETE /api/v1/interview/question-bank/:id ───────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub success: bool,
    pub question: QuestionDto,
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let id = parse_object_id(&id)?;
    let question = state
        .db
        .get_question(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question {} not found", id.to_hex())))?;
    Ok(Json(QuestionResponse {
        success: true,
        question: QuestionDto::from(&question),
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_object_id(&id)?;
    if !state.db.delete_question(id).await? {
        return Err(ApiError::not_found(format!(
            "question {} not found",
            id.to_hex()
        )));
    }
    Ok(Json(DeleteResponse { success: true }))
}

// ── GET /api/v1/interview/sessions ───────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SessionListQuery {
    pub user: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummaryDto>,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<SessionListQuery>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let user = params
        .user
        .as_deref()
        .map(parse_object_id)
        .transpose()?;
    let sessions = state.db.list_sessions(user).await?;
    Ok(Json(SessionListResponse {
        success: true,
        sessions: sessions.iter().map(SessionSummaryDto::from).collect(),
    }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let id = parse_object_id(&id)?;
    let session = state
        .db
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("session {} not found", id.to_hex())))?;

    Ok(Json(SessionDetailResponse {
        success: true,
        summary: SessionSummaryDto::from(&session),
        responses: session.responses.clone(),
        overall_feedback: session.overall_feedback.clone(),
        averages: session.score_averages(),
        end_time: session
            .end_time
            .and_then(|t| t.try_to_rfc3339_string().ok()),
    }))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Difficulty, QuestionDraft, QuestionType};

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(items.clone(), 1, 10), (1..=10).collect::<Vec<_>>());
        assert_eq!(paginate(items.clone(), 3, 10), (21..=25).collect::<Vec<_>>());
        assert!(paginate(items, 4, 10).is_empty());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn test_query_to_filter() {
        let query = QuestionBankQuery {
            kind: Some("technical".to_string()),
            difficulty: Some("easy".to_string()),
            category: Some("all".to_string()),
            ..QuestionBankQuery::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.kind, Some(QuestionType::Technical));
        assert_eq!(filter.difficulty, Some(Difficulty::Easy));
        // "all" means no category constraint
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_query_rejects_bad_enum() {
        let query = QuestionBankQuery {
            kind: Some("quiz".to_string()),
            ..QuestionBankQuery::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_question_dto_shape() {
        let mut question = QuestionDraft {
            question: "Describe a failed project.".to_string(),
            answer: "Honestly.".to_string(),
            kind: "behavioral".to_string(),
            category: "retrospective".to_string(),
            difficulty: "medium".to_string(),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap();
        question.id = Some(ObjectId::new());

        let dto = QuestionDto::from(&question);
        assert_eq!(dto.id, question.id.unwrap().to_hex());
        assert_eq!(dto.kind, "behavioral");
        assert!(dto.created_by.is_none());

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["type"], "behavioral");
        assert!(json["createdAt"].is_string());
        assert!(json.get("company").is_none());
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::bad_request("missing required field(s): answer");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
