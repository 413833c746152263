//! crates/sat_content_core/src/testing.rs
//!
//! In-memory fakes of the service ports, shared by the workflow unit tests.
//! The fakes record every call so tests can assert on side effects (or the
//! absence of them) without a database or an AI API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Difficulty, Genre, Passage, PassageDraft, PracticeAttempt, Question, QuestionDraft,
    QuestionSnapshot, StudyPlan, DailyPlanEntry, Subject,
};
use crate::ports::{
    ContentGenerationService, DataStoreService, IdentityService, PortError, PortResult,
    QuestionDraftRequest, StudyPlanService,
};

//=========================================================================================
// Sample data builders
//=========================================================================================

pub fn sample_passage_draft() -> PassageDraft {
    PassageDraft {
        title: "The Transcontinental Railroad".to_string(),
        text: "In the spring of 1869, two crews of laborers met at Promontory Summit..."
            .to_string(),
        genre: Genre::History,
        word_count: 300,
    }
}

pub fn sample_question_draft() -> QuestionDraft {
    QuestionDraft {
        subject: Subject::Math,
        kind: "algebra".to_string(),
        question_text: "If 3x - 5 = 10, what is the value of x?".to_string(),
        options: vec!["3".to_string(), "5".to_string(), "10".to_string(), "15".to_string()],
        correct_answer: "5".to_string(),
        explanation: "Add 5 to both sides, then divide by 3.".to_string(),
        difficulty: Difficulty::Medium,
        is_multiple_choice: true,
        passage_id: None,
    }
}

pub fn sample_attempt(
    user_id: &str,
    subject: Subject,
    kind: &str,
    is_correct: bool,
) -> PracticeAttempt {
    PracticeAttempt {
        user_id: user_id.to_string(),
        question_data: QuestionSnapshot {
            id: Some(Uuid::new_v4().to_string()),
            subject: Some(subject),
            kind: Some(kind.to_string()),
            extra: serde_json::Map::new(),
        },
        is_correct,
        user_answer: None,
        selected_option: None,
        timestamp: Utc::now(),
    }
}

//=========================================================================================
// FakeStore
//=========================================================================================

/// An in-memory `DataStoreService` with scripted failure modes.
#[derive(Default)]
pub struct FakeStore {
    passages: Mutex<Vec<Passage>>,
    questions: Mutex<Vec<Question>>,
    attempts: Mutex<Vec<PracticeAttempt>>,
    sessions: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_passage_create: AtomicBool,
    question_poison: Mutex<Option<String>>,
}

impl FakeStore {
    pub fn passages(&self) -> Vec<Passage> {
        self.passages.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }

    /// Number of successful writes of any kind.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes the next passage creations fail.
    pub fn fail_passage_creates(&self) {
        self.fail_passage_create.store(true, Ordering::SeqCst);
    }

    /// Makes question creations fail when the question text contains `marker`.
    pub fn fail_question_writes_containing(&self, marker: &str) {
        *self.question_poison.lock().unwrap() = Some(marker.to_string());
    }

    /// Appends an attempt directly, bypassing the port (newest last).
    pub fn seed_attempt(&self, attempt: PracticeAttempt) {
        self.attempts.lock().unwrap().push(attempt);
    }

    pub fn seed_session(&self, session_id: &str, user_id: &str) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), user_id.to_string());
    }
}

#[async_trait]
impl DataStoreService for FakeStore {
    async fn create_passage(
        &self,
        draft: &PassageDraft,
        created_by: &str,
    ) -> PortResult<Passage> {
        if self.fail_passage_create.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("scripted passage failure".to_string()));
        }
        let passage = Passage {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            text: draft.text.clone(),
            genre: draft.genre,
            word_count: draft.word_count,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        self.passages.lock().unwrap().push(passage.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(passage)
    }

    async fn get_passage_by_id(&self, passage_id: Uuid) -> PortResult<Passage> {
        self.passages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == passage_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Passage {} not found", passage_id)))
    }

    async fn list_passages(&self, genre: Option<Genre>, limit: u32) -> PortResult<Vec<Passage>> {
        let passages = self
            .passages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| genre.map_or(true, |g| p.genre == g))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(passages)
    }

    async fn create_question(
        &self,
        draft: &QuestionDraft,
        created_by: &str,
    ) -> PortResult<Question> {
        if let Some(marker) = self.question_poison.lock().unwrap().as_deref() {
            if draft.question_text.contains(marker) {
                return Err(PortError::Unexpected("scripted question failure".to_string()));
            }
        }
        let question = Question {
            id: Uuid::new_v4(),
            subject: draft.subject,
            kind: draft.kind.clone(),
            question_text: draft.question_text.clone(),
            options: draft.options.clone(),
            correct_answer: draft.correct_answer.clone(),
            explanation: draft.explanation.clone(),
            difficulty: draft.difficulty,
            is_multiple_choice: draft.is_multiple_choice,
            passage_id: draft.passage_id,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        self.questions.lock().unwrap().push(question.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(question)
    }

    async fn list_questions(
        &self,
        subject: Subject,
        kind: Option<&str>,
        difficulty: Option<Difficulty>,
        limit: u32,
    ) -> PortResult<Vec<Question>> {
        let questions = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.subject == subject)
            .filter(|q| kind.map_or(true, |k| q.kind == k))
            .filter(|q| difficulty.map_or(true, |d| q.difficulty == d))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(questions)
    }

    async fn save_practice_attempt(&self, attempt: &PracticeAttempt) -> PortResult<Uuid> {
        self.attempts.lock().unwrap().push(attempt.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Uuid::new_v4())
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: u32,
    ) -> PortResult<Vec<PracticeAttempt>> {
        let attempts = self
            .attempts
            .lock()
            .unwrap()
            .iter()
            .rev() // seeded oldest-first; callers expect newest-first
            .filter(|a| a.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(attempts)
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("unknown session".to_string()))
    }
}

//=========================================================================================
// FakeGenerator
//=========================================================================================

/// A scripted AI collaborator covering both generation ports. By default it
/// returns one well-formed passage draft and three well-formed reading
/// drafts; `script_questions` overrides the question output.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    scripted_questions: Mutex<Option<Vec<QuestionDraft>>>,
    questions_unavailable: AtomicBool,
    summaries: Mutex<Vec<String>>,
}

impl FakeGenerator {
    /// Total calls across all generation methods.
    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fixes the output of every subsequent `draft_questions` call.
    pub fn script_questions(&self, drafts: Vec<QuestionDraft>) {
        *self.scripted_questions.lock().unwrap() = Some(drafts);
    }

    /// Makes `draft_questions` signal an empty batch the way the production
    /// adapter does: as `PortError::NoContentGenerated`.
    pub fn fail_questions_with_no_content(&self) {
        self.questions_unavailable.store(true, Ordering::SeqCst);
    }

    /// The history summary most recently passed to `draft_study_plan`.
    pub fn last_summary(&self) -> Option<String> {
        self.summaries.lock().unwrap().last().cloned()
    }

    fn default_reading_drafts(count: u32) -> Vec<QuestionDraft> {
        (0..count)
            .map(|i| QuestionDraft {
                subject: Subject::Reading,
                kind: "passage_question".to_string(),
                question_text: format!("What is the main idea of paragraph {}?", i + 1),
                options: vec![
                    "A".to_string(),
                    "B".to_string(),
                    "C".to_string(),
                    "D".to_string(),
                ],
                correct_answer: "B".to_string(),
                explanation: "The paragraph develops this idea throughout.".to_string(),
                difficulty: Difficulty::Medium,
                is_multiple_choice: true,
                passage_id: None,
            })
            .collect()
    }
}

#[async_trait]
impl ContentGenerationService for FakeGenerator {
    async fn draft_passage(
        &self,
        genre: Genre,
        word_count: u32,
        _topic: Option<&str>,
    ) -> PortResult<PassageDraft> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut draft = sample_passage_draft();
        draft.genre = genre;
        draft.word_count = word_count;
        Ok(draft)
    }

    async fn draft_questions(
        &self,
        request: &QuestionDraftRequest,
    ) -> PortResult<Vec<QuestionDraft>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.questions_unavailable.load(Ordering::SeqCst) {
            return Err(PortError::NoContentGenerated);
        }
        if let Some(scripted) = self.scripted_questions.lock().unwrap().as_ref() {
            return Ok(scripted.clone());
        }
        Ok(Self::default_reading_drafts(request.count))
    }
}

#[async_trait]
impl StudyPlanService for FakeGenerator {
    async fn draft_study_plan(&self, history_summary: &str) -> PortResult<StudyPlan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.summaries
            .lock()
            .unwrap()
            .push(history_summary.to_string());
        Ok(StudyPlan {
            strengths: vec!["math - algebra".to_string()],
            weaknesses: vec!["reading - main_idea".to_string()],
            daily_plan: vec![DailyPlanEntry {
                day: "Monday".to_string(),
                tasks: vec!["Practice 5 main-idea questions".to_string()],
            }],
        })
    }
}

//=========================================================================================
// FakeIdentity
//=========================================================================================

/// An identity collaborator with a fixed admin allow-list.
pub struct FakeIdentity {
    admins: HashSet<String>,
}

impl FakeIdentity {
    pub fn new(admins: &[&str]) -> Self {
        Self {
            admins: admins.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn is_admin(&self, user_id: &str) -> PortResult<bool> {
        Ok(self.admins.contains(user_id))
    }
}
