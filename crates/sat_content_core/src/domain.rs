//! crates/sat_content_core/src/domain.rs
//!
//! Defines the pure, core data structures for the content pipeline.
//! These structs are independent of any database or web framework; serde
//! derives exist because drafts round-trip through the client as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The genre of an SAT reading passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    LiteraryNarrative,
    SocialScience,
    NaturalScience,
    History,
}

/// The subject a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Reading,
    Writing,
}

/// The difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Genre::LiteraryNarrative => "literary_narrative",
            Genre::SocialScience => "social_science",
            Genre::NaturalScience => "natural_science",
            Genre::History => "history",
        };
        f.write_str(label)
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "literary_narrative" => Ok(Genre::LiteraryNarrative),
            "social_science" => Ok(Genre::SocialScience),
            "natural_science" => Ok(Genre::NaturalScience),
            "history" => Ok(Genre::History),
            other => Err(format!("'{}' is not a recognized passage genre", other)),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Subject::Math => "math",
            Subject::Reading => "reading",
            Subject::Writing => "writing",
        };
        f.write_str(label)
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" => Ok(Subject::Math),
            "reading" => Ok(Subject::Reading),
            "writing" => Ok(Subject::Writing),
            other => Err(format!("'{}' is not a recognized subject", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(label)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("'{}' is not a recognized difficulty", other)),
        }
    }
}

//=========================================================================================
// Passages
//=========================================================================================

/// A persisted SAT reading passage. Identity is assigned by the data store
/// at persistence time; passages are never edited through this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub genre: Genre,
    pub word_count: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Upper bound on a passage's word count. Real SAT passages run a few
/// hundred words; anything past this is a malformed request.
pub const MAX_WORD_COUNT: u32 = 10_000;

/// An AI-generated passage candidate, held by the client during review.
/// It has no identity until it is resubmitted for approval and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageDraft {
    pub title: String,
    pub text: String,
    pub genre: Genre,
    pub word_count: u32,
}

impl PassageDraft {
    /// Checks the fields a resubmitted draft must carry before it may be
    /// persisted. Resubmitted drafts are untrusted client input.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("passage title must not be empty".to_string());
        }
        if self.text.trim().is_empty() {
            return Err("passage text must not be empty".to_string());
        }
        if self.word_count == 0 {
            return Err("passage word count must be greater than zero".to_string());
        }
        if self.word_count > MAX_WORD_COUNT {
            return Err(format!(
                "passage word count must not exceed {}",
                MAX_WORD_COUNT
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Questions
//=========================================================================================

/// A persisted SAT practice question, optionally linked to a passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub subject: Subject,
    /// Free-form topic tag, e.g. "algebra", "main_idea", "grammar".
    #[serde(rename = "type")]
    pub kind: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub is_multiple_choice: bool,
    pub passage_id: Option<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A question candidate awaiting approval. Produced by the generator or
/// resubmitted (possibly edited) by the reviewing client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub subject: Subject,
    #[serde(rename = "type")]
    pub kind: String,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub is_multiple_choice: bool,
    #[serde(default)]
    pub passage_id: Option<Uuid>,
}

impl QuestionDraft {
    /// Checks the structural invariants a question must satisfy before
    /// persistence: required text fields are present, and multiple-choice
    /// questions list their correct answer among the options. Grading
    /// downstream compares answers case-insensitively, so membership is
    /// checked the same way.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind.trim().is_empty() {
            return Err("question type must not be empty".to_string());
        }
        if self.question_text.trim().is_empty() {
            return Err("question text must not be empty".to_string());
        }
        if self.correct_answer.trim().is_empty() {
            return Err("correct answer must not be empty".to_string());
        }
        if self.explanation.trim().is_empty() {
            return Err("explanation must not be empty".to_string());
        }
        if self.is_multiple_choice {
            if self.options.is_empty() {
                return Err("multiple-choice question has no options".to_string());
            }
            let answer_listed = self
                .options
                .iter()
                .any(|option| option.eq_ignore_ascii_case(&self.correct_answer));
            if !answer_listed {
                return Err("correct answer is not one of the options".to_string());
            }
        }
        Ok(())
    }
}

//=========================================================================================
// Practice history
//=========================================================================================

/// The question snapshot embedded in a practice attempt. Attempts store the
/// full question as submitted by the client, so the fields the aggregator
/// cares about may be missing; unknown fields are preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One answered practice question. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAttempt {
    pub user_id: String,
    pub question_data: QuestionSnapshot,
    pub is_correct: bool,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub selected_option: Option<String>,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Study plans
//=========================================================================================

/// One day of a personalized study plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlanEntry {
    pub day: String,
    pub tasks: Vec<String>,
}

/// A derived study plan. Never persisted; recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub daily_plan: Vec<DailyPlanEntry>,
}
