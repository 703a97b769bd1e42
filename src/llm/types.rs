//! Azure OpenAI wire types and errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Usage;

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request to Azure OpenAI failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Azure OpenAI returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

/// A message in the completion prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text("assistant", content)
    }

    /// Assistant turn that only carries a function call.
    pub fn function_request(call: FunctionCall) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Result of an executed function, fed back to the model.
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "function".to_string(),
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }
}

/// A callable function offered to the model.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDef {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Options for a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// Parsed result of a chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: Option<String>,
    pub function_call: Option<FunctionCall>,
    pub usage: Usage,
    pub finish_reason: Option<String>,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
pub(super) struct CompletionRequest<'a> {
    pub messages: &'a [PromptMessage],
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<&'a [FunctionDef]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<&'static str>,
}

#[derive(Deserialize)]
pub(super) struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
pub(super) struct CompletionChoice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

#[derive(Serialize)]
pub(super) struct EmbeddingRequest<'a> {
    pub input: &'a str,
}

#[derive(Deserialize)]
pub(super) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
pub(super) struct EmbeddingData {
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_request_serializes_null_content() {
        let msg = PromptMessage::function_request(FunctionCall {
            name: "search_games".into(),
            arguments: "{\"query\":\"team\"}".into(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json["content"].is_null());
        assert_eq!(json["function_call"]["name"], "search_games");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_function_result_carries_name() {
        let msg = PromptMessage::function_result("get_pfadfinder_knowledge", "{}");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "function");
        assert_eq!(json["name"], "get_pfadfinder_knowledge");
    }
}
