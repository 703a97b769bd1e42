//! Root and health endpoints.

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{HealthResponse, ServiceHealth};
use crate::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET / - Service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Pfadi AI Assistant API",
        "version": VERSION,
        "status": "healthy",
    }))
}

/// GET /health - Liveness probe.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "pfadi-ai-assistant" }))
}

/// GET /api/v1/health - Dependency report.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match state.repo.ping().await {
        Ok(()) => ("healthy", "healthy".to_string()),
        Err(e) => ("degraded", format!("unhealthy: {}", e.message())),
    };

    let search_index = match state.index.num_docs() {
        0 => "empty",
        _ => "healthy",
    };

    let azure_openai = if state.llm.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
        services: ServiceHealth {
            database,
            search_index: search_index.to_string(),
            azure_openai: azure_openai.to_string(),
        },
    })
}

/// GET /api/v1/health/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong", "timestamp": Utc::now() }))
}
