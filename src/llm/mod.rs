//! Azure OpenAI client.
//!
//! Speaks the deployment-scoped REST API directly: chat completions with
//! legacy function calling, and embeddings. The client only exists when both
//! endpoint and key are configured; callers treat `None` as "not available".

mod types;

pub use types::*;

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::AzureConfig;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    chat_deployment: String,
    embedding_deployment: String,
    api_version: String,
}

impl AzureOpenAiClient {
    /// Build a client from configuration. Returns `Ok(None)` when credentials are missing.
    pub fn from_config(config: &AzureConfig) -> Result<Option<Self>, LlmError> {
        let (Some(endpoint), Some(api_key)) = (&config.openai_endpoint, &config.openai_api_key)
        else {
            tracing::warn!(
                endpoint_configured = config.openai_endpoint.is_some(),
                key_configured = config.openai_api_key.is_some(),
                "Azure OpenAI credentials not configured. Chat functionality will be limited."
            );
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;

        tracing::info!("Azure OpenAI client initialized");

        Ok(Some(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            chat_deployment: config.chat_deployment.clone(),
            embedding_deployment: config.embedding_deployment.clone(),
            api_version: config.api_version.clone(),
        }))
    }

    /// Generate a chat completion, optionally offering callable functions.
    pub async fn chat_completion(
        &self,
        messages: &[PromptMessage],
        functions: Option<&[FunctionDef]>,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let body = CompletionRequest {
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            functions,
            function_call: functions.map(|_| "auto"),
        };

        tracing::info!(
            model = %self.chat_deployment,
            message_count = messages.len(),
            temperature = options.temperature,
            "Sending chat completion request"
        );

        let response: CompletionResponse = self
            .post_json(&self.deployment_url(&self.chat_deployment, "chat/completions"), &body)
            .await?;

        let usage = response.usage.unwrap_or_default();
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ApiParse("response contained no choices".to_string()))?;

        tracing::info!(
            tokens_used = usage.total_tokens,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "Chat completion successful"
        );

        Ok(Completion {
            message: choice.message.content,
            function_call: choice.message.function_call,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    /// Generate an embedding vector for `text`.
    pub async fn embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response: EmbeddingResponse = self
            .post_json(
                &self.deployment_url(&self.embedding_deployment, "embeddings"),
                &EmbeddingRequest { input: text },
            )
            .await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::ApiParse("response contained no embedding".to_string()))?;

        tracing::debug!(
            text_length = text.len(),
            embedding_dimensions = embedding.len(),
            "Embedding generation successful"
        );
        Ok(embedding)
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, self.api_version
        )
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<T, LlmError> {
        let response = self
            .http
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        serde_json::from_str(&text).map_err(|e| LlmError::ApiParse(e.to_string()))
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero-length input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process stand-in for an Azure OpenAI deployment.

    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    use crate::config::AzureConfig;

    /// Scripted behaviour of the fake deployment.
    #[derive(Clone, Default)]
    pub struct Script {
        /// Completion replies, consumed front to back; the last one repeats.
        pub completions: Vec<Value>,
        /// Status returned for every request instead of a reply, if set.
        pub fail_status: Option<u16>,
    }

    #[derive(Clone)]
    struct FakeState {
        script: Arc<Mutex<Script>>,
        requests: Arc<Mutex<Vec<Value>>>,
    }

    pub struct FakeAzure {
        pub config: AzureConfig,
        pub requests: Arc<Mutex<Vec<Value>>>,
    }

    pub fn text_reply(text: &str) -> Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
        })
    }

    pub fn function_reply(name: &str, arguments: Value) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": { "name": name, "arguments": arguments.to_string() }
                },
                "finish_reason": "function_call"
            }],
            "usage": { "prompt_tokens": 30, "completion_tokens": 10, "total_tokens": 40 }
        })
    }

    /// Embedding derived from keyword presence so similarity is predictable.
    fn embed(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        ["vertrauen", "team", "kreativ", "fahne", "knoten"]
            .iter()
            .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
            .collect()
    }

    async fn completions(
        State(state): State<FakeState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("fake-key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
        }
        state.requests.lock().unwrap().push(body);
        let mut script = state.script.lock().unwrap();
        if let Some(status) = script.fail_status {
            return (
                StatusCode::from_u16(status).unwrap(),
                Json(json!({ "error": "scripted failure" })),
            );
        }
        let reply = if script.completions.len() > 1 {
            script.completions.remove(0)
        } else {
            script
                .completions
                .first()
                .cloned()
                .unwrap_or_else(|| text_reply("ok"))
        };
        (StatusCode::OK, Json(reply))
    }

    async fn embeddings(
        State(state): State<FakeState>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if let Some(status) = state.script.lock().unwrap().fail_status {
            return (
                StatusCode::from_u16(status).unwrap(),
                Json(json!({ "error": "scripted failure" })),
            );
        }
        let input = body["input"].as_str().unwrap_or_default();
        (
            StatusCode::OK,
            Json(json!({ "data": [{ "embedding": embed(input) }] })),
        )
    }

    /// Serve the fake on an ephemeral port.
    pub async fn spawn(script: Script) -> FakeAzure {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            script: Arc::new(Mutex::new(script)),
            requests: requests.clone(),
        };
        let app = Router::new()
            .route(
                "/openai/deployments/{deployment}/chat/completions",
                post(completions),
            )
            .route("/openai/deployments/{deployment}/embeddings", post(embeddings))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeAzure {
            config: AzureConfig {
                openai_endpoint: Some(format!("http://{}/", addr)),
                openai_api_key: Some("fake-key".to_string()),
                ..AzureConfig::default()
            },
            requests,
        }
    }
}
