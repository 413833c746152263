//! crates/sat_content_core/src/content.rs
//!
//! The content generation/approval/publish pipeline: drafting passages and
//! questions for human review, and publishing approved drafts with
//! failure-isolated batch persistence.
//!
//! Drafts round-trip through the reviewing client between the generate and
//! approve calls, so everything resubmitted for publishing is treated as
//! untrusted input and re-validated here.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, Genre, PassageDraft, QuestionDraft, Subject};
use crate::error::WorkflowError;
use crate::ports::{
    ContentGenerationService, DataStoreService, IdentityService, PortError, QuestionDraftRequest,
};

/// How many linked questions are requested when a passage is approved.
const LINKED_QUESTION_COUNT: u32 = 3;

/// The result of approving a passage: the persisted passage's identity and
/// the number of linked questions that were generated and saved.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub passage_id: Uuid,
    pub questions_generated: usize,
}

/// The result of a batch persistence pass. `succeeded.len() + failed` always
/// equals the number of items submitted.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: usize,
}

/// Orchestrates draft generation and publishing over the injected
/// collaborators. Stateless between calls; the review gate lives entirely on
/// the client side.
pub struct ContentPipeline {
    store: Arc<dyn DataStoreService>,
    generator: Arc<dyn ContentGenerationService>,
    identity: Arc<dyn IdentityService>,
}

impl ContentPipeline {
    pub fn new(
        store: Arc<dyn DataStoreService>,
        generator: Arc<dyn ContentGenerationService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            store,
            generator,
            identity,
        }
    }

    /// Denies non-admin requesters before any collaborator is touched.
    async fn require_admin(&self, requester: &str) -> Result<(), WorkflowError> {
        if self.identity.is_admin(requester).await? {
            Ok(())
        } else {
            Err(WorkflowError::Unauthorized)
        }
    }

    /// Generates a passage draft for review. Nothing is persisted; the draft
    /// is handed back to the caller until an approve call resubmits it.
    pub async fn generate_passage_draft(
        &self,
        requester: &str,
        genre: Genre,
        word_count: u32,
        topic: Option<&str>,
    ) -> Result<PassageDraft, WorkflowError> {
        self.require_admin(requester).await?;

        if word_count == 0 || word_count > crate::domain::MAX_WORD_COUNT {
            return Err(WorkflowError::ValidationFailed(format!(
                "word count must be between 1 and {}",
                crate::domain::MAX_WORD_COUNT
            )));
        }

        let draft = self
            .generator
            .draft_passage(genre, word_count, topic)
            .await
            .map_err(WorkflowError::from_generation)?;

        info!(%genre, word_count, "generated passage draft for review");
        Ok(draft)
    }

    /// Generates question drafts for review. Nothing is persisted.
    ///
    /// Every returned draft's passage linkage is re-derived here: reading
    /// drafts get the caller-supplied passage id (or none), and math/writing
    /// drafts are always standalone, regardless of what the generator
    /// produced. Downstream consumers rely on standalone questions needing
    /// no passage fetch.
    pub async fn generate_question_drafts(
        &self,
        requester: &str,
        request: QuestionDraftRequest,
    ) -> Result<Vec<QuestionDraft>, WorkflowError> {
        self.require_admin(requester).await?;

        if request.count == 0 {
            return Err(WorkflowError::ValidationFailed(
                "question count must be greater than zero".to_string(),
            ));
        }

        let mut drafts = self
            .generator
            .draft_questions(&request)
            .await
            .map_err(WorkflowError::from_generation)?;
        if drafts.is_empty() {
            return Err(WorkflowError::NoContentGenerated);
        }

        let linked_passage = match request.subject {
            Subject::Reading => request.passage_id,
            Subject::Math | Subject::Writing => None,
        };
        for draft in &mut drafts {
            draft.passage_id = linked_passage;
        }

        info!(
            subject = %request.subject,
            count = drafts.len(),
            "generated question drafts for review"
        );
        Ok(drafts)
    }

    /// Publishes an approved passage draft: persists the passage, generates
    /// three linked reading questions against its text, and persists each of
    /// them independently.
    ///
    /// If the passage cannot be persisted, nothing else happens. If question
    /// generation then produces zero drafts, the already-persisted passage is
    /// NOT rolled back and the call fails with `NoQuestionsGenerated`.
    /// Individual question persistence failures reduce the reported count but
    /// do not fail the operation.
    pub async fn approve_passage(
        &self,
        requester: &str,
        draft: PassageDraft,
    ) -> Result<PublishOutcome, WorkflowError> {
        self.require_admin(requester).await?;
        draft
            .validate()
            .map_err(WorkflowError::ValidationFailed)?;

        let passage = self.store.create_passage(&draft, requester).await?;
        info!(passage_id = %passage.id, genre = %passage.genre, "passage persisted");

        let request = QuestionDraftRequest {
            subject: Subject::Reading,
            count: LINKED_QUESTION_COUNT,
            difficulty: Difficulty::Medium,
            kind: Some("passage_question".to_string()),
            context_text: Some(passage.text.clone()),
            passage_id: Some(passage.id),
        };
        // The port signals a well-formed empty batch as its own error; here
        // that means the distinct zero-questions outcome, not a generic miss.
        let mut drafts = match self.generator.draft_questions(&request).await {
            Ok(drafts) => drafts,
            Err(PortError::NoContentGenerated) => Vec::new(),
            Err(other) => return Err(WorkflowError::from_generation(other)),
        };
        if drafts.is_empty() {
            warn!(
                passage_id = %passage.id,
                "no questions generated for approved passage; passage remains persisted"
            );
            return Err(WorkflowError::NoQuestionsGenerated);
        }

        // The generator's own linkage is never trusted.
        for question in &mut drafts {
            question.subject = Subject::Reading;
            question.passage_id = Some(passage.id);
        }

        let outcome = self.persist_all(&drafts, requester).await;
        info!(
            passage_id = %passage.id,
            saved = outcome.succeeded.len(),
            failed = outcome.failed,
            "linked questions persisted"
        );

        Ok(PublishOutcome {
            passage_id: passage.id,
            questions_generated: outcome.succeeded.len(),
        })
    }

    /// Publishes a batch of approved question drafts. Authorization is
    /// checked once for the whole batch; each item is then validated and
    /// persisted independently of its siblings.
    pub async fn approve_question_batch(
        &self,
        requester: &str,
        drafts: Vec<QuestionDraft>,
    ) -> Result<BatchOutcome, WorkflowError> {
        self.require_admin(requester).await?;

        if drafts.is_empty() {
            return Err(WorkflowError::ValidationFailed(
                "question batch must not be empty".to_string(),
            ));
        }

        Ok(self.persist_all(&drafts, requester).await)
    }

    /// Fan-out-and-collect persistence: every draft is validated and written
    /// in its own attempt, all attempts are issued, and no failure skips a
    /// sibling. Individual causes are retained in logs only; callers see the
    /// partitioned counts. Callers are responsible for authorization.
    pub async fn persist_all(&self, drafts: &[QuestionDraft], created_by: &str) -> BatchOutcome {
        let attempts = drafts.iter().map(|draft| async move {
            draft.validate().map_err(PortError::Unexpected)?;
            self.store.create_question(draft, created_by).await
        });
        let results = futures::future::join_all(attempts).await;

        let mut outcome = BatchOutcome::default();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(question) => outcome.succeeded.push(question.id),
                Err(cause) => {
                    outcome.failed += 1;
                    error!(item = index, %cause, "failed to persist question draft");
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::DataStoreService;
    use crate::testing::{
        sample_passage_draft, sample_question_draft, FakeGenerator, FakeIdentity, FakeStore,
    };

    fn pipeline(
        store: &Arc<FakeStore>,
        generator: &Arc<FakeGenerator>,
        identity: &Arc<FakeIdentity>,
    ) -> ContentPipeline {
        ContentPipeline::new(store.clone(), generator.clone(), identity.clone())
    }

    fn reading_request(passage_id: Option<Uuid>) -> QuestionDraftRequest {
        QuestionDraftRequest {
            subject: Subject::Reading,
            count: 3,
            difficulty: Difficulty::Medium,
            kind: None,
            context_text: None,
            passage_id,
        }
    }

    #[tokio::test]
    async fn non_admin_is_denied_with_no_collaborator_calls() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&[]));
        let pipeline = pipeline(&store, &generator, &identity);

        let draft_result = pipeline
            .generate_passage_draft("student@example.com", Genre::History, 300, None)
            .await;
        assert!(matches!(draft_result, Err(WorkflowError::Unauthorized)));

        let approve_result = pipeline
            .approve_passage("student@example.com", sample_passage_draft())
            .await;
        assert!(matches!(approve_result, Err(WorkflowError::Unauthorized)));

        let questions_result = pipeline
            .generate_question_drafts("student@example.com", reading_request(None))
            .await;
        assert!(matches!(questions_result, Err(WorkflowError::Unauthorized)));

        let batch_result = pipeline
            .approve_question_batch("student@example.com", vec![sample_question_draft()])
            .await;
        assert!(matches!(batch_result, Err(WorkflowError::Unauthorized)));

        assert_eq!(generator.total_calls(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn standalone_math_drafts_are_never_passage_linked() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        // The generator misbehaves and links every draft to a random passage.
        let mut stray = sample_question_draft();
        stray.subject = Subject::Math;
        stray.passage_id = Some(Uuid::new_v4());
        generator.script_questions(vec![stray.clone(), stray.clone()]);
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let request = QuestionDraftRequest {
            subject: Subject::Math,
            count: 2,
            difficulty: Difficulty::Hard,
            kind: Some("algebra".to_string()),
            context_text: None,
            passage_id: Some(Uuid::new_v4()),
        };
        let drafts = pipeline
            .generate_question_drafts("admin@example.com", request)
            .await
            .unwrap();

        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| d.passage_id.is_none()));
    }

    #[tokio::test]
    async fn reading_drafts_carry_the_caller_supplied_passage_id() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let mut stray = sample_question_draft();
        stray.subject = Subject::Reading;
        stray.passage_id = Some(Uuid::new_v4());
        generator.script_questions(vec![stray]);
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let wanted = Uuid::new_v4();
        let drafts = pipeline
            .generate_question_drafts("admin@example.com", reading_request(Some(wanted)))
            .await
            .unwrap();

        assert!(drafts.iter().all(|d| d.passage_id == Some(wanted)));
    }

    #[tokio::test]
    async fn approve_passage_links_all_questions_to_the_new_passage() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let outcome = pipeline
            .approve_passage("admin@example.com", sample_passage_draft())
            .await
            .unwrap();

        assert_eq!(outcome.questions_generated, 3);
        let questions = store.questions();
        assert_eq!(questions.len(), 3);
        assert!(questions
            .iter()
            .all(|q| q.passage_id == Some(outcome.passage_id)));
        assert!(questions.iter().all(|q| q.subject == Subject::Reading));
        // created_by comes from the authenticated requester, not the payload.
        assert!(questions.iter().all(|q| q.created_by == "admin@example.com"));
    }

    #[tokio::test]
    async fn passage_survives_when_no_questions_are_generated() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        generator.script_questions(Vec::new());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let result = pipeline
            .approve_passage("admin@example.com", sample_passage_draft())
            .await;
        assert!(matches!(result, Err(WorkflowError::NoQuestionsGenerated)));

        // The documented asymmetry: the passage stays persisted and fetchable.
        let passages = store.passages();
        assert_eq!(passages.len(), 1);
        let fetched = store.get_passage_by_id(passages[0].id).await.unwrap();
        assert_eq!(fetched.title, passages[0].title);
        assert!(store.questions().is_empty());
    }

    #[tokio::test]
    async fn no_content_signal_from_the_generator_is_the_zero_questions_outcome() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        generator.fail_questions_with_no_content();
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let result = pipeline
            .approve_passage("admin@example.com", sample_passage_draft())
            .await;
        assert!(matches!(result, Err(WorkflowError::NoQuestionsGenerated)));

        // Same asymmetry as the empty-vector case: the passage stays saved.
        assert_eq!(store.passages().len(), 1);
        assert!(store.questions().is_empty());
    }

    #[tokio::test]
    async fn invalid_resubmitted_draft_is_rejected_before_any_write() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let mut draft = sample_passage_draft();
        draft.title = "   ".to_string();
        let result = pipeline.approve_passage("admin@example.com", draft).await;

        assert!(matches!(result, Err(WorkflowError::ValidationFailed(_))));
        assert_eq!(store.write_count(), 0);
        assert_eq!(generator.total_calls(), 0);
    }

    #[tokio::test]
    async fn failed_passage_persistence_generates_no_questions() {
        let store = Arc::new(FakeStore::default());
        store.fail_passage_creates();
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let result = pipeline
            .approve_passage("admin@example.com", sample_passage_draft())
            .await;

        assert!(matches!(result, Err(WorkflowError::Store(_))));
        assert_eq!(generator.total_calls(), 0);
        assert!(store.questions().is_empty());
    }

    #[tokio::test]
    async fn batch_failures_are_isolated_from_siblings() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let mut malformed = sample_question_draft();
        malformed.question_text = String::new();
        let batch = vec![
            sample_question_draft(),
            malformed,
            sample_question_draft(),
        ];
        let total = batch.len();

        let outcome = pipeline
            .approve_question_batch("admin@example.com", batch)
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.succeeded.len() + outcome.failed, total);
        assert_eq!(store.questions().len(), 2);
    }

    #[tokio::test]
    async fn store_failures_also_leave_siblings_untouched() {
        let store = Arc::new(FakeStore::default());
        store.fail_question_writes_containing("poison");
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let mut doomed = sample_question_draft();
        doomed.question_text = "poison pill".to_string();
        let batch = vec![sample_question_draft(), doomed, sample_question_draft()];

        let outcome = pipeline
            .approve_question_batch("admin@example.com", batch)
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn generate_then_approve_round_trip() {
        let store = Arc::new(FakeStore::default());
        let generator = Arc::new(FakeGenerator::default());
        let identity = Arc::new(FakeIdentity::new(&["admin@example.com"]));
        let pipeline = pipeline(&store, &generator, &identity);

        let draft = pipeline
            .generate_passage_draft("admin@example.com", Genre::History, 300, None)
            .await
            .unwrap();

        // The client reviews the draft and resubmits it verbatim.
        let outcome = pipeline
            .approve_passage("admin@example.com", draft)
            .await
            .unwrap();

        assert_eq!(outcome.questions_generated, 3);
        assert!(!outcome.passage_id.is_nil());
    }
}
