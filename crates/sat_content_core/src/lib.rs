pub mod content;
pub mod domain;
pub mod error;
pub mod ports;
pub mod study;

#[cfg(test)]
pub mod testing;

pub use content::{BatchOutcome, ContentPipeline, PublishOutcome};
pub use domain::{
    DailyPlanEntry, Difficulty, Genre, Passage, PassageDraft, PracticeAttempt, Question,
    QuestionDraft, QuestionSnapshot, StudyPlan, Subject,
};
pub use error::WorkflowError;
pub use ports::{
    ContentGenerationService, DataStoreService, IdentityService, PortError, PortResult,
    QuestionDraftRequest, StudyPlanService,
};
pub use study::{StudyPlanner, HISTORY_WINDOW, MIN_HISTORY};
