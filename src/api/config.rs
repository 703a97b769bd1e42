//! Configuration and setup endpoints.

use axum::{extract::State, Json};

use crate::config::Config;
use crate::llm::{CompletionOptions, PromptMessage};
use crate::models::{
    AzureConfigGuide, AzureTestResult, ConfigStatus, EnvTemplate, FeatureFlags, GuideStep,
    GuideVariable,
};
use crate::AppState;

/// GET /api/v1/config/status - Which Azure variables are missing.
pub async fn config_status(State(state): State<AppState>) -> Json<ConfigStatus> {
    Json(status_of(&state.config))
}

fn status_of(config: &Config) -> ConfigStatus {
    let azure = &config.azure;
    let required = [
        ("AZURE_OPENAI_ENDPOINT", azure.openai_endpoint.is_some()),
        ("AZURE_OPENAI_API_KEY", azure.openai_api_key.is_some()),
        (
            "AZURE_OPENAI_DEPLOYMENT_NAME",
            !azure.chat_deployment.is_empty(),
        ),
        (
            "AZURE_EMBEDDING_DEPLOYMENT_NAME",
            !azure.embedding_deployment.is_empty(),
        ),
    ];
    let optional = [
        ("AZURE_SEARCH_ENDPOINT", azure.search_endpoint.is_some()),
        ("AZURE_SEARCH_API_KEY", azure.search_api_key.is_some()),
    ];

    let mut missing_variables: Vec<String> = required
        .iter()
        .filter(|(_, set)| !set)
        .map(|(name, _)| name.to_string())
        .collect();
    let configured = missing_variables.is_empty();
    missing_variables.extend(
        optional
            .iter()
            .filter(|(_, set)| !set)
            .map(|(name, _)| format!("{} (optional)", name)),
    );

    ConfigStatus {
        configured,
        missing_variables,
        environment: config.environment.clone(),
        features: FeatureFlags::from(&config.features),
    }
}

fn step(step: &str, title: &str, description: &str, action: &str) -> GuideStep {
    GuideStep {
        step: step.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        action: action.to_string(),
    }
}

fn variable(name: &str, description: &str, example: &str) -> GuideVariable {
    GuideVariable {
        name: name.to_string(),
        description: description.to_string(),
        example: example.to_string(),
    }
}

/// GET /api/v1/config/azure/guide - Setup steps for Azure OpenAI.
pub async fn azure_guide() -> Json<AzureConfigGuide> {
    Json(AzureConfigGuide {
        steps: vec![
            step(
                "1",
                "Azure OpenAI Resource erstellen",
                "Erstelle eine Azure OpenAI Resource in deinem Azure Portal",
                "Gehe zu portal.azure.com → Create a resource → Azure OpenAI",
            ),
            step(
                "2",
                "GPT-4 Deployment erstellen",
                "Erstelle ein Deployment für GPT-4 in deiner Azure OpenAI Resource",
                "Azure OpenAI Studio → Deployments → Create new deployment → gpt-4",
            ),
            step(
                "3",
                "Embedding Deployment erstellen",
                "Erstelle ein Deployment für text-embedding-ada-002",
                "Azure OpenAI Studio → Deployments → Create new deployment → text-embedding-ada-002",
            ),
            step(
                "4",
                "API Keys kopieren",
                "Kopiere den API Key und Endpoint aus deiner Azure OpenAI Resource",
                "Azure Portal → deine OpenAI Resource → Keys and Endpoint",
            ),
            step(
                "5",
                "Environment Variables setzen",
                "Trage die Werte in deine .env Datei ein",
                "Bearbeite .env mit den kopierten Werten",
            ),
            step(
                "6",
                "Service neu starten",
                "Starte den Service neu, um die neuen Einstellungen zu laden",
                "pfadi-assistant serve",
            ),
        ],
        required_variables: vec![
            variable(
                "AZURE_OPENAI_ENDPOINT",
                "Der Endpoint deiner Azure OpenAI Resource",
                "https://your-resource-name.openai.azure.com/",
            ),
            variable(
                "AZURE_OPENAI_API_KEY",
                "Der API Key deiner Azure OpenAI Resource",
                "1234567890abcdef1234567890abcdef",
            ),
            variable(
                "AZURE_OPENAI_DEPLOYMENT_NAME",
                "Name deines GPT-4 Deployments",
                "gpt-4",
            ),
            variable(
                "AZURE_EMBEDDING_DEPLOYMENT_NAME",
                "Name deines Embedding Deployments",
                "text-embedding-ada-002",
            ),
        ],
        test_endpoints: vec![
            "/api/v1/health".to_string(),
            "/api/v1/chat/status".to_string(),
            "/api/v1/config/status".to_string(),
        ],
    })
}

/// GET /api/v1/config/azure/test - Probe the model with a tiny completion.
///
/// Always answers 200; the outcome is in `success`.
pub async fn azure_test(State(state): State<AppState>) -> Json<AzureTestResult> {
    let Some(llm) = &state.llm else {
        return Json(AzureTestResult {
            success: false,
            message: "Azure OpenAI ist nicht konfiguriert oder nicht verfügbar".to_string(),
            test_response: None,
            usage: None,
            details: Some("Prüfe deine Umgebungsvariablen in der .env Datei".to_string()),
        });
    };

    let prompt = [
        PromptMessage::system("Du bist ein Test-Assistent."),
        PromptMessage::user("Sage 'Test erfolgreich' auf Deutsch."),
    ];
    let options = CompletionOptions {
        temperature: 0.1,
        max_tokens: Some(50),
    };

    let result = match llm.chat_completion(&prompt, None, &options).await {
        Ok(completion) => match completion.message {
            Some(message) => AzureTestResult {
                success: true,
                message: "Azure OpenAI Verbindung erfolgreich!".to_string(),
                test_response: Some(message),
                usage: Some(completion.usage),
                details: None,
            },
            None => AzureTestResult {
                success: false,
                message: "Azure OpenAI antwortet nicht wie erwartet".to_string(),
                test_response: None,
                usage: Some(completion.usage),
                details: completion.finish_reason,
            },
        },
        Err(e) => {
            tracing::error!(error = %e, "Azure connection test failed");
            AzureTestResult {
                success: false,
                message: "Fehler beim Testen der Azure OpenAI Verbindung".to_string(),
                test_response: None,
                usage: None,
                details: Some(e.to_string()),
            }
        }
    };
    Json(result)
}

/// Show only a short prefix of a secret.
fn mask(secret: &str) -> String {
    match secret.get(..4) {
        Some(prefix) if secret.len() > 8 => format!("{}****", prefix),
        _ => "****".to_string(),
    }
}

/// GET /api/v1/config/env/template - A `.env` skeleton with the current values.
pub async fn env_template(State(state): State<AppState>) -> Json<EnvTemplate> {
    Json(EnvTemplate {
        template: render_template(&state.config),
        current_status: status_of(&state.config),
    })
}

fn render_template(config: &Config) -> String {
    let azure = &config.azure;
    let or = |value: &Option<String>, placeholder: &str| {
        value.clone().unwrap_or_else(|| placeholder.to_string())
    };
    let secret = |value: &Option<String>, placeholder: &str| {
        value
            .as_deref()
            .map(mask)
            .unwrap_or_else(|| placeholder.to_string())
    };

    [
        "# Azure OpenAI Configuration".to_string(),
        format!(
            "AZURE_OPENAI_ENDPOINT={}",
            or(
                &azure.openai_endpoint,
                "https://your-resource-name.openai.azure.com/"
            )
        ),
        format!(
            "AZURE_OPENAI_API_KEY={}",
            secret(&azure.openai_api_key, "your-azure-openai-api-key")
        ),
        format!("AZURE_OPENAI_DEPLOYMENT_NAME={}", azure.chat_deployment),
        format!(
            "AZURE_EMBEDDING_DEPLOYMENT_NAME={}",
            azure.embedding_deployment
        ),
        format!("AZURE_OPENAI_API_VERSION={}", azure.api_version),
        String::new(),
        "# Azure AI Search (Optional)".to_string(),
        format!(
            "AZURE_SEARCH_ENDPOINT={}",
            or(
                &azure.search_endpoint,
                "https://your-search-service.search.windows.net"
            )
        ),
        format!(
            "AZURE_SEARCH_API_KEY={}",
            secret(&azure.search_api_key, "your-search-api-key")
        ),
        format!("AZURE_SEARCH_INDEX_NAME={}", azure.search_index_name),
        String::new(),
        "# Application Settings".to_string(),
        format!("PFADI_ENVIRONMENT={}", config.environment),
        format!("PFADI_BIND_ADDR={}", config.bind_addr),
        format!("PFADI_LOG_LEVEL={}", config.log_level),
        format!("PFADI_DB_PATH={}", config.db_path.display()),
        format!("PFADI_INDEX_PATH={}", config.index_path.display()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mask() {
        assert_eq!(mask("abcdef1234567890"), "abcd****");
        assert_eq!(mask("short"), "****");
    }

    #[test]
    fn test_status_lists_missing_variables() {
        let config = Config::for_paths(PathBuf::from("db"), PathBuf::from("idx"));
        let status = status_of(&config);

        assert!(!status.configured);
        assert_eq!(
            status.missing_variables,
            vec![
                "AZURE_OPENAI_ENDPOINT",
                "AZURE_OPENAI_API_KEY",
                "AZURE_SEARCH_ENDPOINT (optional)",
                "AZURE_SEARCH_API_KEY (optional)",
            ]
        );
    }

    #[test]
    fn test_template_masks_secrets() {
        let mut config = Config::for_paths(PathBuf::from("db"), PathBuf::from("idx"));
        config.azure.openai_api_key = Some("sk-verysecretkey".to_string());

        let template = render_template(&config);
        assert!(template.contains("AZURE_OPENAI_API_KEY=sk-v****"));
        assert!(!template.contains("verysecret"));
        assert!(template.contains("AZURE_OPENAI_DEPLOYMENT_NAME=gpt-4"));
    }
}
