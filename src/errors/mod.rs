//! Service errors and the JSON envelope they are rendered into.
//!
//! Every failure leaves a handler as
//! `{ "success": false, "error": { "code", "message", "details"? } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Machine-readable codes carried in `error.code`.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const FEATURE_DISABLED: &str = "FEATURE_DISABLED";
    pub const INVALID_HOST: &str = "INVALID_HOST";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    /// A feature flag is switched off.
    #[error("{0}")]
    FeatureDisabled(String),
    /// `Host` header outside the allow list.
    #[error("{0}")]
    InvalidHost(String),
    /// Azure OpenAI answered with an error or not at all.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Database(String),
    #[error("{0}")]
    Search(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str) {
        use AppError::*;
        match self {
            NotFound(_) => (StatusCode::NOT_FOUND, codes::NOT_FOUND),
            Validation(_) => (StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR),
            FeatureDisabled(_) => (StatusCode::NOT_IMPLEMENTED, codes::FEATURE_DISABLED),
            InvalidHost(_) => (StatusCode::BAD_REQUEST, codes::INVALID_HOST),
            Upstream(_) => (StatusCode::BAD_GATEWAY, codes::UPSTREAM_ERROR),
            Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::DATABASE_ERROR),
            Search(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::SEARCH_ERROR),
            Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL_ERROR),
            BadRequest(_) => (StatusCode::BAD_REQUEST, codes::BAD_REQUEST),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    /// Human-readable message shown to API users.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Database operation failed");
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!(error = %err, "Search index operation failed");
        AppError::Search(format!("Search error: {}", err))
    }
}

// Only stored plan columns go through serde_json with `?`; request bodies are
// rejected by the axum extractor before reaching a handler.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "Stored JSON could not be processed");
        AppError::Internal(format!("Malformed stored data: {}", err))
    }
}

impl From<crate::llm::LlmError> for AppError {
    fn from(err: crate::llm::LlmError) -> Self {
        tracing::error!(error = %err, "Azure OpenAI call failed");
        AppError::Upstream(err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let (_, code) = error.classify();
        Self {
            success: false,
            error: ErrorDetails {
                code: code.to_string(),
                message: error.message(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), "Request failed: {}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let err = AppError::FeatureDisabled("Chatbot feature is disabled".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(err.error_code(), codes::FEATURE_DISABLED);
        assert_eq!(err.to_string(), "Chatbot feature is disabled");

        assert_eq!(
            AppError::InvalidHost("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse::from(&AppError::Validation("limit must be between 1 and 50".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "limit must be between 1 and 50");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_llm_failures_become_upstream() {
        let err: AppError = crate::llm::LlmError::ApiResponse {
            status: 429,
            body: "slow down".into(),
        }
        .into();
        assert_eq!(err.error_code(), codes::UPSTREAM_ERROR);
    }
}
