//! crates/sat_content_core/src/error.rs
//!
//! The workflow-level error taxonomy shared by the content pipeline and the
//! study planner. Port errors cover the adapter boundary; these cover the
//! outcomes callers of the workflows must distinguish.

use crate::ports::PortError;

/// Failure outcomes of the content and recommendation workflows.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The requester does not hold the required role. Raised before any side
    /// effect; this is a client-visible denial, not a system fault.
    #[error("Only administrators may perform this operation")]
    Unauthorized,

    /// A resubmitted draft or request parameter failed validation. Rejected
    /// before any persistence attempt.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The AI collaborator errored or returned a non-conforming structure.
    /// The payload is the raw diagnostic and must only reach operator logs,
    /// never the end client.
    #[error("Content generation failed: {0}")]
    GenerationFailed(String),

    /// The AI collaborator succeeded structurally but produced zero items.
    #[error("The generator produced no content")]
    NoContentGenerated,

    /// Question generation for a freshly persisted passage produced nothing.
    /// The passage is NOT rolled back; this asymmetry is deliberate and
    /// surfaced distinctly so operators can follow up.
    #[error("No questions were generated for the approved passage")]
    NoQuestionsGenerated,

    /// The user has too little practice history for a meaningful plan.
    /// User-correctable, not a system error.
    #[error("Not enough practice data to generate a study plan ({found} attempts recorded). Please complete more practice questions.")]
    InsufficientHistory { found: usize },

    /// A data-store failure outside batch persistence (batch item failures
    /// are isolated and summarized instead of propagated).
    #[error("Data store error: {0}")]
    Store(#[from] PortError),
}

impl WorkflowError {
    /// Maps an AI-boundary port error into the workflow taxonomy.
    pub(crate) fn from_generation(error: PortError) -> Self {
        match error {
            PortError::NoContentGenerated => WorkflowError::NoContentGenerated,
            PortError::GenerationFailed(diagnostic) => WorkflowError::GenerationFailed(diagnostic),
            other => WorkflowError::GenerationFailed(other.to_string()),
        }
    }
}
