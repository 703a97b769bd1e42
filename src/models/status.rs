//! Health and configuration status models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Features;

/// Feature switches as reported to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureFlags {
    pub chatbot: bool,
    pub game_search: bool,
    pub planning: bool,
    pub camp_planning: bool,
    pub communication: bool,
}

impl From<&Features> for FeatureFlags {
    fn from(features: &Features) -> Self {
        Self {
            chatbot: features.chatbot,
            game_search: features.game_search,
            planning: features.planning,
            camp_planning: features.camp_planning,
            communication: features.communication,
        }
    }
}

/// Per-dependency health report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub search_index: String,
    pub azure_openai: String,
}

/// Response body of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub services: ServiceHealth,
}

/// Deployment details reported by the chat status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentInfo {
    pub chat_model: String,
    pub embedding_model: String,
    pub endpoint_configured: bool,
    pub api_key_configured: bool,
}

/// Response body of `GET /api/v1/chat/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatStatus {
    pub azure_openai_available: bool,
    pub features_enabled: FeatureFlags,
    pub deployment_info: DeploymentInfo,
}

/// Response body of `GET /api/v1/config/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub configured: bool,
    pub missing_variables: Vec<String>,
    pub environment: String,
    pub features: FeatureFlags,
}

/// A single step of the Azure setup guide.
#[derive(Debug, Clone, Serialize)]
pub struct GuideStep {
    pub step: String,
    pub title: String,
    pub description: String,
    pub action: String,
}

/// A variable documented by the Azure setup guide.
#[derive(Debug, Clone, Serialize)]
pub struct GuideVariable {
    pub name: String,
    pub description: String,
    pub example: String,
}

/// Response body of `GET /api/v1/config/azure/guide`.
#[derive(Debug, Clone, Serialize)]
pub struct AzureConfigGuide {
    pub steps: Vec<GuideStep>,
    pub required_variables: Vec<GuideVariable>,
    pub test_endpoints: Vec<String>,
}

/// Result of the Azure connectivity probe.
#[derive(Debug, Clone, Serialize)]
pub struct AzureTestResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<crate::models::Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Response body of `GET /api/v1/config/env/template`.
#[derive(Debug, Clone, Serialize)]
pub struct EnvTemplate {
    pub template: String,
    pub current_status: ConfigStatus,
}
