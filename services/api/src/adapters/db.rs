//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DataStoreService` and `IdentityService` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.
//!
//! Queries are bound at runtime rather than checked with the compile-time
//! macros so the crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sat_content_core::domain::{
    Difficulty, Genre, Passage, PassageDraft, PracticeAttempt, Question, QuestionDraft,
    QuestionSnapshot, Subject,
};
use sat_content_core::ports::{
    DataStoreService, IdentityService, PortError, PortResult,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DataStoreService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PassageRecord {
    id: Uuid,
    title: String,
    text: String,
    genre: String,
    word_count: i32,
    created_by: String,
    created_at: DateTime<Utc>,
}
impl PassageRecord {
    fn to_domain(self) -> PortResult<Passage> {
        let genre = self
            .genre
            .parse::<Genre>()
            .map_err(PortError::Unexpected)?;
        Ok(Passage {
            id: self.id,
            title: self.title,
            text: self.text,
            genre,
            word_count: self.word_count as u32,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    subject: String,
    kind: String,
    question_text: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    difficulty: String,
    is_multiple_choice: bool,
    passage_id: Option<Uuid>,
    created_by: String,
    created_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> PortResult<Question> {
        let subject = self
            .subject
            .parse::<Subject>()
            .map_err(PortError::Unexpected)?;
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(PortError::Unexpected)?;
        Ok(Question {
            id: self.id,
            subject,
            kind: self.kind,
            question_text: self.question_text,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            difficulty,
            is_multiple_choice: self.is_multiple_choice,
            passage_id: self.passage_id,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AttemptRecord {
    user_id: String,
    question_data: serde_json::Value,
    is_correct: bool,
    user_answer: Option<String>,
    selected_option: Option<String>,
    timestamp: DateTime<Utc>,
}
impl AttemptRecord {
    fn to_domain(self) -> PortResult<PracticeAttempt> {
        let question_data: QuestionSnapshot = serde_json::from_value(self.question_data)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(PracticeAttempt {
            user_id: self.user_id,
            question_data,
            is_correct: self.is_correct,
            user_answer: self.user_answer,
            selected_option: self.selected_option,
            timestamp: self.timestamp,
        })
    }
}

//=========================================================================================
// `DataStoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DataStoreService for DbAdapter {
    async fn create_passage(
        &self,
        draft: &PassageDraft,
        created_by: &str,
    ) -> PortResult<Passage> {
        let record = sqlx::query_as::<_, PassageRecord>(
            "INSERT INTO sat_passages (id, title, text, genre, word_count, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, title, text, genre, word_count, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.text)
        .bind(draft.genre.to_string())
        .bind(draft.word_count as i32)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_passage_by_id(&self, passage_id: Uuid) -> PortResult<Passage> {
        let record = sqlx::query_as::<_, PassageRecord>(
            "SELECT id, title, text, genre, word_count, created_by, created_at
             FROM sat_passages WHERE id = $1",
        )
        .bind(passage_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Passage {} not found", passage_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_passages(&self, genre: Option<Genre>, limit: u32) -> PortResult<Vec<Passage>> {
        let records = sqlx::query_as::<_, PassageRecord>(
            "SELECT id, title, text, genre, word_count, created_by, created_at
             FROM sat_passages
             WHERE ($1::text IS NULL OR genre = $1)
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(genre.map(|g| g.to_string()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_question(
        &self,
        draft: &QuestionDraft,
        created_by: &str,
    ) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(
            "INSERT INTO sat_questions
                 (id, subject, kind, question_text, options, correct_answer,
                  explanation, difficulty, is_multiple_choice, passage_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id, subject, kind, question_text, options, correct_answer,
                       explanation, difficulty, is_multiple_choice, passage_id,
                       created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(draft.subject.to_string())
        .bind(draft.kind.to_lowercase())
        .bind(&draft.question_text)
        .bind(&draft.options)
        .bind(&draft.correct_answer)
        .bind(&draft.explanation)
        .bind(draft.difficulty.to_string())
        .bind(draft.is_multiple_choice)
        .bind(draft.passage_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_questions(
        &self,
        subject: Subject,
        kind: Option<&str>,
        difficulty: Option<Difficulty>,
        limit: u32,
    ) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, subject, kind, question_text, options, correct_answer,
                    explanation, difficulty, is_multiple_choice, passage_id,
                    created_by, created_at
             FROM sat_questions
             WHERE subject = $1
               AND ($2::text IS NULL OR kind = $2)
               AND ($3::text IS NULL OR difficulty = $3)
             ORDER BY created_at DESC
             LIMIT $4",
        )
        .bind(subject.to_string())
        .bind(kind.map(|k| k.to_lowercase()))
        .bind(difficulty.map(|d| d.to_string()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_practice_attempt(&self, attempt: &PracticeAttempt) -> PortResult<Uuid> {
        let question_data = serde_json::to_value(&attempt.question_data)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO practice_attempts
                 (id, user_id, question_data, is_correct, user_answer, selected_option, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(&attempt.user_id)
        .bind(question_data)
        .bind(attempt.is_correct)
        .bind(&attempt.user_answer)
        .bind(&attempt.selected_option)
        .bind(attempt.timestamp)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(id)
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: u32,
    ) -> PortResult<Vec<PracticeAttempt>> {
        let records = sqlx::query_as::<_, AttemptRecord>(
            "SELECT user_id, question_data, is_correct, user_answer, selected_option, timestamp
             FROM practice_attempts
             WHERE user_id = $1
             ORDER BY timestamp DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        let row: (String,) = sqlx::query_as(
            "SELECT user_email FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound("Auth session not found or expired".to_string())
            }
            _ => unexpected(e),
        })?;
        Ok(row.0)
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for DbAdapter {
    async fn is_admin(&self, user_id: &str) -> PortResult<bool> {
        let role: Option<(String,)> =
            sqlx::query_as("SELECT role FROM users WHERE email = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(matches!(role, Some((r,)) if r == "admin"))
    }
}
