//! Chat request/response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A remembered chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Optional information about the person chatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

/// Request body for `POST /api/v1/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

/// Follow-up action offered after an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestedAction {
    pub text: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Token accounting reported by the model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response body for `POST /api/v1/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<bool>,
}

/// Exported conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationExport {
    pub conversation_id: String,
    pub exported_at: DateTime<Utc>,
    pub message_count: usize,
    pub messages: Vec<ChatMessage>,
}
