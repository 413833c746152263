//! services/api/src/adapters/content_llm.rs
//!
//! This module contains the adapter for the content-drafting LLM.
//! It implements the `ContentGenerationService` port from the `core` crate,
//! constraining every call to a fixed JSON schema and validating the returned
//! structure before it crosses back into the core.

const PASSAGE_SYSTEM_INSTRUCTIONS: &str = "You are an expert SAT content author. \
You write original reading passages in the style and register of real SAT exams. \
Passages must be self-contained, factually plausible, and appropriate for \
high-school test preparation. Respond only with the requested JSON structure.";

const QUESTION_SYSTEM_INSTRUCTIONS: &str = "You are an expert SAT content author. \
You write original practice questions matching the style, rigor, and answer-choice \
conventions of real SAT exams. For every multiple-choice question the correct \
answer must be exactly one of the listed options. If a question is not multiple \
choice, its options list must be empty and isMultipleChoice must be false. \
Respond only with the requested JSON structure.";

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

use sat_content_core::domain::{Genre, PassageDraft, QuestionDraft, Subject};
use sat_content_core::ports::{
    ContentGenerationService, PortError, PortResult, QuestionDraftRequest,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentGenerationService` using an
/// OpenAI-compatible LLM with schema-constrained output.
#[derive(Clone)]
pub struct OpenAiContentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiContentAdapter {
    /// Creates a new `OpenAiContentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Issues one chat completion constrained to `schema` and returns the
    /// raw JSON content of the first choice.
    async fn structured_completion(
        &self,
        instructions: &str,
        prompt: String,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: schema_name.to_string(),
                    description: None,
                    schema: Some(schema),
                    strict: Some(true),
                },
            })
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationFailed(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::GenerationFailed(
                    "content LLM response contained no text content".to_string(),
                )
            })
    }
}

//=========================================================================================
// Structured-Output Payloads and Schemas
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassagePayload {
    title: String,
    text: String,
    genre: Genre,
    word_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionPayload {
    subject: Subject,
    #[serde(rename = "type")]
    kind: String,
    question_text: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    difficulty: sat_content_core::domain::Difficulty,
    is_multiple_choice: bool,
}

#[derive(Deserialize)]
struct QuestionBatchPayload {
    questions: Vec<QuestionPayload>,
}

fn passage_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "text": { "type": "string" },
            "genre": {
                "type": "string",
                "enum": ["literary_narrative", "social_science", "natural_science", "history"]
            },
            "wordCount": { "type": "integer" }
        },
        "required": ["title", "text", "genre", "wordCount"],
        "additionalProperties": false
    })
}

fn question_batch_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "subject": { "type": "string", "enum": ["math", "reading", "writing"] },
                        "type": { "type": "string" },
                        "questionText": { "type": "string" },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "correctAnswer": { "type": "string" },
                        "explanation": { "type": "string" },
                        "difficulty": { "type": "string", "enum": ["easy", "medium", "hard"] },
                        "isMultipleChoice": { "type": "boolean" }
                    },
                    "required": [
                        "subject", "type", "questionText", "options", "correctAnswer",
                        "explanation", "difficulty", "isMultipleChoice"
                    ],
                    "additionalProperties": false
                }
            }
        },
        "required": ["questions"],
        "additionalProperties": false
    })
}

//=========================================================================================
// Prompt Construction
//=========================================================================================

fn passage_prompt(genre: Genre, word_count: u32, topic: Option<&str>) -> String {
    let mut prompt = format!(
        "Write an original SAT-style reading passage in the '{}' genre, \
         approximately {} words long.",
        genre, word_count
    );
    if let Some(topic) = topic {
        prompt.push_str(&format!(" The passage should be about: {}.", topic.trim()));
    }
    prompt.push_str(
        "\nReturn a title, the full passage text, the genre, and the actual word count.",
    );
    prompt
}

fn question_prompt(request: &QuestionDraftRequest) -> String {
    let mut prompt = format!(
        "Generate {} SAT-style {} {} questions.\n",
        request.count, request.difficulty, request.subject
    );
    if let Some(kind) = request.kind.as_deref() {
        prompt.push_str(&format!("Focus on '{}' type questions.\n", kind));
    }

    match (request.subject, request.context_text.as_deref()) {
        (Subject::Reading, Some(context)) => {
            prompt.push_str(
                "Every question must be answerable only from the passage below. \
                 Base all questions, options, and explanations strictly on its content.\n\
                 PASSAGE:\n---\n",
            );
            prompt.push_str(context);
            prompt.push_str("\n---\n");
        }
        _ => {
            prompt.push_str(
                "Every question must be fully self-contained: do not reference any \
                 passage, figure, or external context.\n",
            );
        }
    }

    prompt.push_str(
        "For each question include: subject, type (e.g. 'algebra', 'geometry', 'grammar', \
         'main_idea', 'passage_question', 'rhetoric'), questionText, options (empty array \
         if not multiple choice), correctAnswer, explanation, difficulty, and \
         isMultipleChoice. Ensure the correct answer is always one of the provided \
         options when isMultipleChoice is true.",
    );
    prompt
}

//=========================================================================================
// `ContentGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentGenerationService for OpenAiContentAdapter {
    /// Drafts one passage. The draft is validated against the required-field
    /// rules before it is returned; a structurally broken response surfaces
    /// as `GenerationFailed` carrying the raw payload for operator logs.
    async fn draft_passage(
        &self,
        genre: Genre,
        word_count: u32,
        topic: Option<&str>,
    ) -> PortResult<PassageDraft> {
        let content = self
            .structured_completion(
                PASSAGE_SYSTEM_INSTRUCTIONS,
                passage_prompt(genre, word_count, topic),
                "sat_passage",
                passage_schema(),
            )
            .await?;

        let payload: PassagePayload = serde_json::from_str(&content).map_err(|e| {
            PortError::GenerationFailed(format!(
                "passage output did not match schema: {}. Raw response: {}",
                e, content
            ))
        })?;

        let draft = PassageDraft {
            title: payload.title,
            text: payload.text,
            genre: payload.genre,
            word_count: payload.word_count,
        };
        draft.validate().map_err(|reason| {
            PortError::GenerationFailed(format!(
                "generated passage failed validation: {}. Raw response: {}",
                reason, content
            ))
        })?;
        Ok(draft)
    }

    /// Drafts a batch of questions. An empty but well-formed batch is the
    /// distinct `NoContentGenerated` outcome, not a failure.
    async fn draft_questions(
        &self,
        request: &QuestionDraftRequest,
    ) -> PortResult<Vec<QuestionDraft>> {
        let content = self
            .structured_completion(
                QUESTION_SYSTEM_INSTRUCTIONS,
                question_prompt(request),
                "sat_questions",
                question_batch_schema(),
            )
            .await?;

        let payload: QuestionBatchPayload = serde_json::from_str(&content).map_err(|e| {
            PortError::GenerationFailed(format!(
                "question output did not match schema: {}. Raw response: {}",
                e, content
            ))
        })?;

        if payload.questions.is_empty() {
            return Err(PortError::NoContentGenerated);
        }

        let drafts: Vec<QuestionDraft> = payload
            .questions
            .into_iter()
            .map(|q| QuestionDraft {
                subject: q.subject,
                kind: q.kind,
                question_text: q.question_text,
                options: q.options,
                correct_answer: q.correct_answer,
                explanation: q.explanation,
                difficulty: q.difficulty,
                is_multiple_choice: q.is_multiple_choice,
                // linkage is assigned by the pipeline, never taken from the model
                passage_id: None,
            })
            .collect();

        for draft in &drafts {
            draft.validate().map_err(|reason| {
                PortError::GenerationFailed(format!(
                    "generated question failed validation: {}. Raw response: {}",
                    reason, content
                ))
            })?;
        }
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sat_content_core::domain::Difficulty;

    fn reading_request(context: Option<&str>) -> QuestionDraftRequest {
        QuestionDraftRequest {
            subject: Subject::Reading,
            count: 3,
            difficulty: Difficulty::Medium,
            kind: Some("passage_question".to_string()),
            context_text: context.map(|c| c.to_string()),
            passage_id: None,
        }
    }

    #[test]
    fn reading_prompt_binds_questions_to_the_passage() {
        let prompt = question_prompt(&reading_request(Some("The railroad changed everything.")));
        assert!(prompt.contains("answerable only from the passage"));
        assert!(prompt.contains("The railroad changed everything."));
    }

    #[test]
    fn math_prompt_demands_self_contained_questions() {
        let request = QuestionDraftRequest {
            subject: Subject::Math,
            count: 5,
            difficulty: Difficulty::Hard,
            kind: Some("geometry".to_string()),
            context_text: None,
            passage_id: None,
        };
        let prompt = question_prompt(&request);
        assert!(prompt.contains("fully self-contained"));
        assert!(prompt.contains("'geometry'"));
        assert!(!prompt.contains("PASSAGE:"));
    }

    #[test]
    fn passage_prompt_mentions_genre_word_count_and_topic() {
        let prompt = passage_prompt(Genre::History, 300, Some("the transcontinental railroad"));
        assert!(prompt.contains("'history'"));
        assert!(prompt.contains("300 words"));
        assert!(prompt.contains("the transcontinental railroad"));
    }
}
