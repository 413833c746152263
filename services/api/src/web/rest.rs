//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Role checks happen inside the workflows, not here; the handlers translate
//! wire payloads at the boundary and map workflow outcomes onto HTTP status
//! codes. Generation diagnostics are logged and never relayed to clients.

use crate::web::protocol::{
    ApprovePassageRequest, ApprovePassageResponse, ApproveQuestionBatchRequest,
    ApproveQuestionBatchResponse, FetchPassagesResponse, FetchQuestionsResponse,
    GeneratePassageRequest, GenerateQuestionsRequest, PassageBody, PassageDraftBody,
    PassageDraftResponse, QuestionBody, QuestionDraftBody, QuestionDraftsResponse,
    SaveAttemptRequest, SaveAttemptResponse, StudyPlanBody,
};
use crate::web::state::{AppState, AuthUser};
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi};
use uuid::Uuid;

use sat_content_core::domain::{PracticeAttempt, QuestionSnapshot};
use sat_content_core::error::WorkflowError;
use sat_content_core::ports::QuestionDraftRequest;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_passage_handler,
        approve_passage_handler,
        fetch_passages_handler,
        generate_question_drafts_handler,
        approve_question_batch_handler,
        fetch_questions_handler,
        save_practice_attempt_handler,
        generate_study_plan_handler,
    ),
    components(
        schemas(
            GeneratePassageRequest,
            PassageDraftResponse,
            PassageDraftBody,
            ApprovePassageRequest,
            ApprovePassageResponse,
            FetchPassagesResponse,
            PassageBody,
            GenerateQuestionsRequest,
            QuestionDraftsResponse,
            QuestionDraftBody,
            ApproveQuestionBatchRequest,
            ApproveQuestionBatchResponse,
            FetchQuestionsResponse,
            QuestionBody,
            SaveAttemptRequest,
            SaveAttemptResponse,
            StudyPlanBody,
            crate::web::protocol::DailyPlanBody,
        )
    ),
    tags(
        (name = "SAT Content API", description = "Content generation, review, and publishing for SAT practice material.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a workflow failure onto an HTTP response. Operator-facing
/// diagnostics are logged here and replaced with generic client messages.
fn workflow_error_response(operation: &str, error: WorkflowError) -> (StatusCode, String) {
    match error {
        WorkflowError::Unauthorized => (StatusCode::FORBIDDEN, error.to_string()),
        WorkflowError::ValidationFailed(_) | WorkflowError::InsufficientHistory { .. } => {
            (StatusCode::BAD_REQUEST, error.to_string())
        }
        WorkflowError::NoContentGenerated | WorkflowError::NoQuestionsGenerated => {
            (StatusCode::NOT_FOUND, error.to_string())
        }
        WorkflowError::GenerationFailed(diagnostic) => {
            error!(operation, %diagnostic, "content generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}.", operation),
            )
        }
        WorkflowError::Store(cause) => {
            error!(operation, %cause, "data store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}.", operation),
            )
        }
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

/// Row limit for the fetch endpoints: an absent or zero `count` means one row.
fn fetch_limit(count: Option<u32>) -> u32 {
    count.filter(|c| *c > 0).unwrap_or(1)
}

//=========================================================================================
// Passage Handlers
//=========================================================================================

/// Generate an SAT passage draft for review. Nothing is persisted.
#[utoipa::path(
    post,
    path = "/passages/generate",
    request_body = GeneratePassageRequest,
    responses(
        (status = 200, description = "Draft generated", body = PassageDraftResponse),
        (status = 400, description = "Invalid genre or word count"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 500, description = "Generation failed")
    )
)]
pub async fn generate_passage_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(requester)): Extension<AuthUser>,
    Json(payload): Json<GeneratePassageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let genre = payload.genre.parse().map_err(bad_request)?;

    let draft = app_state
        .pipeline
        .generate_passage_draft(&requester, genre, payload.word_count, payload.topic.as_deref())
        .await
        .map_err(|e| workflow_error_response("generate passage", e))?;

    Ok(Json(PassageDraftResponse {
        message: "Passage generated for review. It has not been saved.".to_string(),
        passage_draft: PassageDraftBody::from_domain(draft),
    }))
}

/// Approve a reviewed passage draft: persists it and generates three linked
/// reading questions against its text.
#[utoipa::path(
    post,
    path = "/passages/approve",
    request_body = ApprovePassageRequest,
    responses(
        (status = 201, description = "Passage published with linked questions", body = ApprovePassageResponse),
        (status = 400, description = "Draft is missing required fields"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "No questions could be generated; the passage itself was saved"),
        (status = 500, description = "Publishing failed")
    )
)]
pub async fn approve_passage_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(requester)): Extension<AuthUser>,
    Json(payload): Json<ApprovePassageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let draft = payload.passage_draft.into_domain().map_err(bad_request)?;

    let outcome = app_state
        .pipeline
        .approve_passage(&requester, draft)
        .await
        .map_err(|e| workflow_error_response("approve passage", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApprovePassageResponse {
            message: format!(
                "Passage approved and saved with {} linked questions.",
                outcome.questions_generated
            ),
            passage_id: outcome.passage_id,
            questions_generated: outcome.questions_generated,
        }),
    ))
}

/// Query parameters for fetching persisted passages.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FetchPassagesQuery {
    pub genre: Option<String>,
    pub count: Option<u32>,
    pub passage_id: Option<Uuid>,
}

/// Fetch persisted passages, optionally filtered by genre or id.
#[utoipa::path(
    get,
    path = "/passages/fetch",
    params(FetchPassagesQuery),
    responses(
        (status = 200, description = "Matching passages", body = FetchPassagesResponse),
        (status = 404, description = "No passages matched the criteria"),
        (status = 500, description = "Lookup failed")
    )
)]
pub async fn fetch_passages_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<FetchPassagesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let passages = if let Some(passage_id) = query.passage_id {
        match app_state.store.get_passage_by_id(passage_id).await {
            Ok(passage) => vec![passage],
            Err(sat_content_core::ports::PortError::NotFound(_)) => Vec::new(),
            Err(e) => {
                error!("Failed to fetch passage: {:?}", e);
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch passages.".to_string(),
                ));
            }
        }
    } else {
        let genre = query
            .genre
            .as_deref()
            .map(|g| g.parse().map_err(bad_request))
            .transpose()?;
        let limit = fetch_limit(query.count);
        app_state
            .store
            .list_passages(genre, limit)
            .await
            .map_err(|e| {
                error!("Failed to fetch passages: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch passages.".to_string(),
                )
            })?
    };

    if passages.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            "No passages found matching the criteria.".to_string(),
        ));
    }

    Ok(Json(FetchPassagesResponse {
        passages: passages.into_iter().map(PassageBody::from_domain).collect(),
    }))
}

//=========================================================================================
// Question Handlers
//=========================================================================================

/// Generate SAT question drafts for review. Nothing is persisted.
#[utoipa::path(
    post,
    path = "/questions/generate",
    request_body = GenerateQuestionsRequest,
    responses(
        (status = 200, description = "Drafts generated", body = QuestionDraftsResponse),
        (status = 400, description = "Invalid subject, difficulty, or count"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "The generator produced no questions"),
        (status = 500, description = "Generation failed")
    )
)]
pub async fn generate_question_drafts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(requester)): Extension<AuthUser>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let subject = payload.subject.parse().map_err(bad_request)?;
    let difficulty = payload.difficulty.parse().map_err(bad_request)?;

    // When drafts are requested against an existing passage, its text is the
    // generation context.
    let context_text = match payload.passage_id {
        Some(passage_id) => {
            let passage = app_state
                .store
                .get_passage_by_id(passage_id)
                .await
                .map_err(|e| match e {
                    sat_content_core::ports::PortError::NotFound(_) => {
                        bad_request("passageId does not reference an existing passage")
                    }
                    other => {
                        error!("Failed to load passage for generation context: {:?}", other);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Failed to generate questions.".to_string(),
                        )
                    }
                })?;
            Some(passage.text)
        }
        None => None,
    };

    let request = QuestionDraftRequest {
        subject,
        count: payload.count,
        difficulty,
        kind: payload.kind,
        context_text,
        passage_id: payload.passage_id,
    };
    let drafts = app_state
        .pipeline
        .generate_question_drafts(&requester, request)
        .await
        .map_err(|e| workflow_error_response("generate questions", e))?;

    Ok(Json(QuestionDraftsResponse {
        message: format!(
            "Generated {} question drafts for review. They have not been saved.",
            drafts.len()
        ),
        question_drafts: drafts
            .into_iter()
            .map(QuestionDraftBody::from_domain)
            .collect(),
    }))
}

/// Approve a reviewed batch of question drafts. Each question is persisted
/// independently; failures are counted, not propagated.
#[utoipa::path(
    post,
    path = "/questions/approve",
    request_body = ApproveQuestionBatchRequest,
    responses(
        (status = 201, description = "Batch processed", body = ApproveQuestionBatchResponse),
        (status = 400, description = "Batch is empty or malformed"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 500, description = "Publishing failed")
    )
)]
pub async fn approve_question_batch_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(requester)): Extension<AuthUser>,
    Json(payload): Json<ApproveQuestionBatchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let drafts = payload
        .questions
        .into_iter()
        .map(|q| q.into_domain())
        .collect::<Result<Vec<_>, _>>()
        .map_err(bad_request)?;

    let outcome = app_state
        .pipeline
        .approve_question_batch(&requester, drafts)
        .await
        .map_err(|e| workflow_error_response("approve questions", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApproveQuestionBatchResponse {
            message: format!("Saved {} questions.", outcome.succeeded.len()),
            succeeded_count: outcome.succeeded.len(),
            failed_count: outcome.failed,
            question_ids: outcome.succeeded,
        }),
    ))
}

/// Query parameters for fetching persisted questions.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuestionsQuery {
    pub subject: String,
    pub count: Option<u32>,
    pub difficulty: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Fetch persisted questions for a subject, optionally filtered further.
#[utoipa::path(
    get,
    path = "/questions/fetch",
    params(FetchQuestionsQuery),
    responses(
        (status = 200, description = "Matching questions", body = FetchQuestionsResponse),
        (status = 400, description = "Invalid subject or difficulty"),
        (status = 404, description = "No questions matched the criteria"),
        (status = 500, description = "Lookup failed")
    )
)]
pub async fn fetch_questions_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<FetchQuestionsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let subject = query.subject.parse().map_err(bad_request)?;
    let difficulty = query
        .difficulty
        .as_deref()
        .map(|d| d.parse().map_err(bad_request))
        .transpose()?;
    let limit = fetch_limit(query.count);

    let questions = app_state
        .store
        .list_questions(subject, query.kind.as_deref(), difficulty, limit)
        .await
        .map_err(|e| {
            error!("Failed to fetch questions: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch questions.".to_string(),
            )
        })?;

    if questions.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            "No questions found matching the criteria.".to_string(),
        ));
    }

    Ok(Json(FetchQuestionsResponse {
        questions: questions
            .into_iter()
            .map(QuestionBody::from_domain)
            .collect(),
    }))
}

//=========================================================================================
// Practice History and Recommendations
//=========================================================================================

/// Record one answered practice question for the authenticated user.
#[utoipa::path(
    post,
    path = "/practice-history/save",
    request_body = SaveAttemptRequest,
    responses(
        (status = 201, description = "Attempt recorded", body = SaveAttemptResponse),
        (status = 400, description = "Question snapshot is missing or has no id"),
        (status = 500, description = "Persistence failed")
    )
)]
pub async fn save_practice_attempt_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<SaveAttemptRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let question_data: QuestionSnapshot = serde_json::from_value(payload.question_data)
        .map_err(|e| bad_request(format!("Invalid question data: {}", e)))?;
    if question_data.id.is_none() {
        return Err(bad_request(
            "Full question data with an id is required to save a practice attempt.",
        ));
    }

    let attempt = PracticeAttempt {
        user_id,
        question_data,
        is_correct: payload.is_correct,
        user_answer: payload.user_answer,
        selected_option: payload.selected_option,
        timestamp: Utc::now(),
    };
    let history_id = app_state
        .store
        .save_practice_attempt(&attempt)
        .await
        .map_err(|e| {
            error!("Failed to save practice attempt: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save practice history.".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SaveAttemptResponse {
            message: "Practice attempt saved successfully.".to_string(),
            history_id,
        }),
    ))
}

/// Generate a personalized study plan from the caller's recent practice.
#[utoipa::path(
    post,
    path = "/recommendations/generate",
    responses(
        (status = 200, description = "Freshly computed study plan", body = StudyPlanBody),
        (status = 400, description = "Not enough practice history"),
        (status = 500, description = "Generation failed")
    )
)]
pub async fn generate_study_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plan = app_state
        .planner
        .generate_study_plan(&user_id)
        .await
        .map_err(|e| workflow_error_response("generate study plan", e))?;

    Ok(Json(StudyPlanBody::from_domain(plan)))
}
