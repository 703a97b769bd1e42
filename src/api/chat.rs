//! Chat endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::ensure_enabled;
use crate::errors::AppError;
use crate::models::{
    ChatMessage, ChatRequest, ChatResponse, ChatStatus, ConversationExport, DeploymentInfo,
    FeatureFlags,
};
use crate::AppState;

/// POST /api/v1/chat - Answer a message.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    ensure_enabled(state.config.features.chatbot, "Chatbot")?;
    Ok(Json(state.chat.process(request).await?))
}

/// GET /api/v1/chat/status - Model availability.
pub async fn chat_status(State(state): State<AppState>) -> Json<ChatStatus> {
    let azure = &state.config.azure;
    Json(ChatStatus {
        azure_openai_available: state.llm.is_some(),
        features_enabled: FeatureFlags::from(&state.config.features),
        deployment_info: DeploymentInfo {
            chat_model: azure.chat_deployment.clone(),
            embedding_model: azure.embedding_deployment.clone(),
            endpoint_configured: azure.openai_endpoint.is_some(),
            api_key_configured: azure.openai_api_key.is_some(),
        },
    })
}

/// GET /api/v1/chat/:id/history - Remembered turns, empty if unknown.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Json<Vec<ChatMessage>> {
    Json(state.chat.history(&conversation_id).await)
}

/// DELETE /api/v1/chat/:id - Forget a conversation.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.chat.clear(&conversation_id).await {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }
    tracing::info!(%conversation_id, "Conversation cleared");
    Ok(Json(json!({
        "message": "Conversation cleared successfully",
        "conversation_id": conversation_id,
    })))
}

/// POST /api/v1/chat/:id/export - Export a conversation.
pub async fn export_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationExport>, AppError> {
    state
        .chat
        .export(&conversation_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Conversation not found or empty".to_string()))
}
