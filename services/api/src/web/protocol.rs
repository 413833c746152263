//! services/api/src/web/protocol.rs
//!
//! Wire-level request and response types for the REST API, plus their
//! conversions to and from the core domain. Enum-valued fields travel as
//! strings and are parsed at this boundary so that malformed client input is
//! rejected with a clear message before it reaches the workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use sat_content_core::domain::{
    DailyPlanEntry, Passage, PassageDraft, Question, QuestionDraft, StudyPlan,
};

//=========================================================================================
// Drafts
//=========================================================================================

/// A passage draft as it travels between the server and the reviewing client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageDraftBody {
    pub title: String,
    pub text: String,
    pub genre: String,
    pub word_count: u32,
}

impl PassageDraftBody {
    pub fn into_domain(self) -> Result<PassageDraft, String> {
        Ok(PassageDraft {
            title: self.title,
            text: self.text,
            genre: self.genre.parse()?,
            word_count: self.word_count,
        })
    }

    pub fn from_domain(draft: PassageDraft) -> Self {
        Self {
            title: draft.title,
            text: draft.text,
            genre: draft.genre.to_string(),
            word_count: draft.word_count,
        }
    }
}

/// A question draft as it travels between the server and the reviewing client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraftBody {
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: String,
    pub is_multiple_choice: bool,
    #[serde(default)]
    pub passage_id: Option<Uuid>,
}

impl QuestionDraftBody {
    pub fn into_domain(self) -> Result<QuestionDraft, String> {
        Ok(QuestionDraft {
            subject: self.subject.parse()?,
            kind: self.kind,
            question_text: self.question_text,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            difficulty: self.difficulty.parse()?,
            is_multiple_choice: self.is_multiple_choice,
            passage_id: self.passage_id,
        })
    }

    pub fn from_domain(draft: QuestionDraft) -> Self {
        Self {
            subject: draft.subject.to_string(),
            kind: draft.kind,
            question_text: draft.question_text,
            options: draft.options,
            correct_answer: draft.correct_answer,
            explanation: draft.explanation,
            difficulty: draft.difficulty.to_string(),
            is_multiple_choice: draft.is_multiple_choice,
            passage_id: draft.passage_id,
        }
    }
}

//=========================================================================================
// Generation and Approval Payloads
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePassageRequest {
    pub genre: String,
    pub word_count: u32,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageDraftResponse {
    pub message: String,
    pub passage_draft: PassageDraftBody,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePassageRequest {
    pub passage_draft: PassageDraftBody,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePassageResponse {
    pub message: String,
    pub passage_id: Uuid,
    pub questions_generated: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub subject: String,
    pub count: u32,
    pub difficulty: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub passage_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraftsResponse {
    pub message: String,
    pub question_drafts: Vec<QuestionDraftBody>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveQuestionBatchRequest {
    pub questions: Vec<QuestionDraftBody>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveQuestionBatchResponse {
    pub message: String,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub question_ids: Vec<Uuid>,
}

//=========================================================================================
// Persisted Content
//=========================================================================================

/// A persisted passage, as returned by the fetch endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageBody {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub genre: String,
    pub word_count: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl PassageBody {
    pub fn from_domain(passage: Passage) -> Self {
        Self {
            id: passage.id,
            title: passage.title,
            text: passage.text,
            genre: passage.genre.to_string(),
            word_count: passage.word_count,
            created_by: passage.created_by,
            created_at: passage.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchPassagesResponse {
    pub passages: Vec<PassageBody>,
}

/// A persisted question, as returned by the fetch endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    pub id: Uuid,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: String,
    pub is_multiple_choice: bool,
    pub passage_id: Option<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl QuestionBody {
    pub fn from_domain(question: Question) -> Self {
        Self {
            id: question.id,
            subject: question.subject.to_string(),
            kind: question.kind,
            question_text: question.question_text,
            options: question.options,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            difficulty: question.difficulty.to_string(),
            is_multiple_choice: question.is_multiple_choice,
            passage_id: question.passage_id,
            created_by: question.created_by,
            created_at: question.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuestionsResponse {
    pub questions: Vec<QuestionBody>,
}

//=========================================================================================
// Practice History
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptRequest {
    /// The full question snapshot as answered, stored verbatim.
    #[schema(value_type = Object)]
    pub question_data: serde_json::Value,
    pub is_correct: bool,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub selected_option: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptResponse {
    pub message: String,
    pub history_id: Uuid,
}

//=========================================================================================
// Study Plans
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlanBody {
    pub day: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanBody {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub daily_plan: Vec<DailyPlanBody>,
}

impl StudyPlanBody {
    pub fn from_domain(plan: StudyPlan) -> Self {
        Self {
            strengths: plan.strengths,
            weaknesses: plan.weaknesses,
            daily_plan: plan
                .daily_plan
                .into_iter()
                .map(|DailyPlanEntry { day, tasks }| DailyPlanBody { day, tasks })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_bodies_reject_unknown_enum_labels() {
        let body = PassageDraftBody {
            title: "t".to_string(),
            text: "x".to_string(),
            genre: "poetry".to_string(),
            word_count: 100,
        };
        assert!(body.into_domain().is_err());
    }

    #[test]
    fn draft_bodies_round_trip() {
        let body = QuestionDraftBody {
            subject: "math".to_string(),
            kind: "algebra".to_string(),
            question_text: "What is 2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_answer: "4".to_string(),
            explanation: "Basic addition.".to_string(),
            difficulty: "easy".to_string(),
            is_multiple_choice: true,
            passage_id: None,
        };
        let domain = body.clone().into_domain().unwrap();
        let back = QuestionDraftBody::from_domain(domain);
        assert_eq!(back.subject, body.subject);
        assert_eq!(back.difficulty, body.difficulty);
        assert_eq!(back.question_text, body.question_text);
    }
}
