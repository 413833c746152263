//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the study-plan LLM.
//! It implements the `StudyPlanService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = "You are an SAT tutor building a one-week study plan. \
You receive a per-topic accuracy summary of a student's recent practice. Identify the \
student's strengths (high-accuracy topics) and weaknesses (low-accuracy topics), then \
lay out a daily plan that spends most of its time on the weaknesses while keeping the \
strengths warm. Keep tasks concrete and achievable in under an hour per day. Respond \
only with the requested JSON structure.";

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

use sat_content_core::domain::StudyPlan;
use sat_content_core::ports::{PortError, PortResult, StudyPlanService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StudyPlanService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPlanAdapter {
    /// Creates a new `OpenAiPlanAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn study_plan_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "strengths": { "type": "array", "items": { "type": "string" } },
            "weaknesses": { "type": "array", "items": { "type": "string" } },
            "dailyPlan": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "day": { "type": "string" },
                        "tasks": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["day", "tasks"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["strengths", "weaknesses", "dailyPlan"],
        "additionalProperties": false
    })
}

//=========================================================================================
// `StudyPlanService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyPlanService for OpenAiPlanAdapter {
    /// Turns a per-topic accuracy summary into a structured study plan.
    async fn draft_study_plan(&self, history_summary: &str) -> PortResult<StudyPlan> {
        let prompt = format!(
            "Here is the student's recent practice summary, one topic per line:\n\n{}\n\n\
             Build the study plan.",
            history_summary
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
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
                    name: "study_plan".to_string(),
                    description: None,
                    schema: Some(study_plan_schema()),
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

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::GenerationFailed(
                    "study plan LLM response contained no text content".to_string(),
                )
            })?;

        serde_json::from_str::<StudyPlan>(&content).map_err(|e| {
            PortError::GenerationFailed(format!(
                "study plan output did not match schema: {}. Raw response: {}",
                e, content
            ))
        })
    }
}
