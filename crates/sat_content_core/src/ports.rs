//! crates/sat_content_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the content pipeline's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the document store
//! or the generative-AI API.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Difficulty, Genre, Passage, PassageDraft, PracticeAttempt, Question, QuestionDraft, StudyPlan,
    Subject,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    /// The AI collaborator errored or returned output that does not conform
    /// to the requested schema. The payload is the raw diagnostic, intended
    /// for operator logs only.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    /// The AI collaborator answered correctly but produced zero items.
    #[error("The generator returned no content")]
    NoContentGenerated,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The document store. Create-with-generated-id, get-by-id, and filtered
/// queries with a row limit; this core only ever appends, never updates.
#[async_trait]
pub trait DataStoreService: Send + Sync {
    // --- Passages ---
    async fn create_passage(&self, draft: &PassageDraft, created_by: &str)
        -> PortResult<Passage>;

    async fn get_passage_by_id(&self, passage_id: Uuid) -> PortResult<Passage>;

    async fn list_passages(&self, genre: Option<Genre>, limit: u32) -> PortResult<Vec<Passage>>;

    // --- Questions ---
    async fn create_question(
        &self,
        draft: &QuestionDraft,
        created_by: &str,
    ) -> PortResult<Question>;

    async fn list_questions(
        &self,
        subject: Subject,
        kind: Option<&str>,
        difficulty: Option<Difficulty>,
        limit: u32,
    ) -> PortResult<Vec<Question>>;

    // --- Practice history (append-only log) ---
    async fn save_practice_attempt(&self, attempt: &PracticeAttempt) -> PortResult<Uuid>;

    /// Returns up to `limit` attempts for the user, newest first.
    async fn recent_attempts(&self, user_id: &str, limit: u32)
        -> PortResult<Vec<PracticeAttempt>>;

    // --- Auth sessions ---
    /// Resolves a browser session id to the user it belongs to.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String>;
}

/// Parameters for one question-drafting call to the AI collaborator.
#[derive(Debug, Clone)]
pub struct QuestionDraftRequest {
    pub subject: Subject,
    pub count: u32,
    pub difficulty: Difficulty,
    /// Optional topic tag to focus on, e.g. "algebra" or "main_idea".
    pub kind: Option<String>,
    /// Passage text the questions must be grounded in. Only meaningful for
    /// reading questions; math and writing drafts must be self-contained.
    pub context_text: Option<String>,
    /// The passage the drafts will be linked to. The pipeline re-forces this
    /// value onto every returned draft, so implementations need not set it.
    pub passage_id: Option<Uuid>,
}

/// The AI collaborator for passage and question drafting. Implementations
/// issue exactly one schema-constrained call per invocation and validate the
/// returned structure before handing it back.
#[async_trait]
pub trait ContentGenerationService: Send + Sync {
    async fn draft_passage(
        &self,
        genre: Genre,
        word_count: u32,
        topic: Option<&str>,
    ) -> PortResult<PassageDraft>;

    async fn draft_questions(&self, request: &QuestionDraftRequest)
        -> PortResult<Vec<QuestionDraft>>;
}

/// The AI collaborator for study-plan synthesis. Receives a plain-text
/// accuracy summary and returns a schema-constrained plan.
#[async_trait]
pub trait StudyPlanService: Send + Sync {
    async fn draft_study_plan(&self, history_summary: &str) -> PortResult<StudyPlan>;
}

/// The identity/authorization collaborator. Token mechanics live elsewhere;
/// the core only asks the yes/no question before privileged operations.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn is_admin(&self, user_id: &str) -> PortResult<bool>;
}
