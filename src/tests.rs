//! Integration tests for the Pfadi assistant service and its terminal client.

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::client::{ApiClient, ChatView, SearchView, FALLBACK};
use crate::config::Config;
use crate::llm::fake;
use crate::models::Role;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::for_paths(
            temp_dir.path().join("test.sqlite"),
            temp_dir.path().join("index"),
        );
        adjust(&mut config);

        let state = AppState::build(config).await.expect("Failed to build state");
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.client.delete(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

// ==================== HEALTH ====================

#[tokio::test]
async fn test_root_and_health() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Pfadi AI Assistant API");

    let (status, body) = fixture.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["service"], "pfadi-ai-assistant");

    let (status, body) = fixture.get("/api/v1/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"], "healthy");
    assert_eq!(body["services"]["search_index"], "healthy");
    assert_eq!(body["services"]["azure_openai"], "not_configured");

    let (status, body) = fixture.get("/api/v1/health/ping").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "pong");
}

#[tokio::test]
async fn test_untrusted_host_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/v1/health/ping"))
        .header("host", "evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_HOST");
}

// ==================== GAMES ====================

#[tokio::test]
async fn test_search_text_match() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/v1/games/search?q=Parcours").await;
    assert_eq!(status, 200);
    assert_eq!(body["search_type"], "text_match");
    assert_eq!(body["games"][0]["gameId"], "game_003");
    assert_eq!(body["games"][0]["durationMinutes"], 20);
    assert!(body["games"][0]["searchScore"].as_f64().unwrap() > 0.0);

    // Partial words match inside compounds such as "Teambuilding".
    let (status, body) = fixture.get("/api/v1/games/search?q=team").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_found"], 4);
}

#[tokio::test]
async fn test_search_filters_without_query() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get("/api/v1/games/search?location=outdoor&participant_count=18")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["search_type"], "filter_only");
    assert_eq!(body["total_found"], 1);
    assert_eq!(body["games"][0]["name"], "Capture the Flag");

    let (_, body) = fixture
        .get("/api/v1/games/search?tags=kreis,ruhig&limit=1")
        .await;
    assert_eq!(body["total_found"], 2);
    assert_eq!(body["games"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_rejects_bad_parameters() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/v1/games/search?q=x&limit=0").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture.get("/api/v1/games/search?limit=51").await;
    assert_eq!(status, 400);

    let (status, body) = fixture.get("/api/v1/games/search?location=moon").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_list_get_and_similar_games() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/v1/games/?limit=2").await;
    assert_eq!(status, 200);
    assert_eq!(body["search_type"], "list");
    assert_eq!(body["total_found"], 5);
    assert_eq!(body["games"].as_array().unwrap().len(), 2);

    let (status, body) = fixture.get("/api/v1/games/game_005").await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Menschliche Knoten");

    let (status, body) = fixture.get("/api/v1/games/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Game not found");

    let (status, body) = fixture.get("/api/v1/games/game_001/similar?limit=2").await;
    assert_eq!(status, 200);
    let similar = body.as_array().unwrap();
    assert!(!similar.is_empty() && similar.len() <= 2);
    assert!(similar.iter().all(|g| g["gameId"] != "game_001"));
}

// ==================== CHAT ====================

#[tokio::test]
async fn test_chat_without_model_lifecycle() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/v1/chat",
            json!({ "message": "Kennst du ein gutes Spiel?" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["mock_response"], true);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Ich kann dir beim Finden von Spielen helfen"));
    assert!(body["suggested_actions"].as_array().unwrap().len() <= 4);

    let id = body["conversation_id"].as_str().unwrap().to_string();

    let (_, history) = fixture.get(&format!("/api/v1/chat/{}/history", id)).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[1]["role"], "assistant");

    let (status, export) = fixture
        .post(&format!("/api/v1/chat/{}/export", id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(export["message_count"], 2);

    let (status, _) = fixture.delete(&format!("/api/v1/chat/{}", id)).await;
    assert_eq!(status, 200);
    let (status, _) = fixture.delete(&format!("/api/v1/chat/{}", id)).await;
    assert_eq!(status, 404);

    let (status, history) = fixture.get(&format!("/api/v1/chat/{}/history", id)).await;
    assert_eq!(status, 200);
    assert_eq!(history, json!([]));

    let (status, _) = fixture
        .post(&format!("/api/v1/chat/{}/export", id), json!({}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post("/api/v1/chat", json!({ "message": "   " }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_disabled_chatbot_returns_501() {
    let fixture = TestFixture::with_config(|c| c.features.chatbot = false).await;

    let (status, body) = fixture
        .post("/api/v1/chat", json!({ "message": "Hallo" }))
        .await;
    assert_eq!(status, 501);
    assert_eq!(body["error"]["code"], "FEATURE_DISABLED");

    let (_, body) = fixture.get("/api/v1/chat/status").await;
    assert_eq!(body["features_enabled"]["chatbot"], false);
    assert_eq!(body["azure_openai_available"], false);
}

#[tokio::test]
async fn test_chat_with_configured_model() {
    let azure = fake::spawn(fake::Script {
        completions: vec![fake::text_reply("Gut Pfad! Wie kann ich helfen?")],
        ..Default::default()
    })
    .await;
    let azure_config = azure.config.clone();
    let fixture = TestFixture::with_config(move |c| c.azure = azure_config).await;

    let (status, body) = fixture
        .post(
            "/api/v1/chat",
            json!({ "message": "Hallo", "user_context": { "name": "Kim" } }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Gut Pfad! Wie kann ich helfen?");
    assert_eq!(body["mock_response"], false);
    assert_eq!(body["usage"]["total_tokens"], 20);

    let (_, body) = fixture.get("/api/v1/config/azure/test").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["test_response"], "Gut Pfad! Wie kann ich helfen?");

    let (_, body) = fixture.get("/api/v1/health").await;
    assert_eq!(body["services"]["azure_openai"], "configured");
}

// ==================== PLANNING ====================

#[tokio::test]
async fn test_planning_lifecycle() {
    let fixture = TestFixture::new().await;

    let (status, plan) = fixture
        .post(
            "/api/v1/planning/heimstunde",
            json!({
                "date": "2026-03-12",
                "duration": 90,
                "participant_count": 12,
                "theme": "Freundschaft",
                "location": "outdoor"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(plan["title"], "Heimstunde 12.03.2026");
    assert_eq!(plan["schedule"].as_array().unwrap().len(), 4);
    assert_eq!(
        plan["schedule"][1]["activity_name"],
        "Aktivität zum Thema 'Freundschaft'"
    );
    assert_eq!(plan["preparation_notes"].as_array().unwrap().len(), 4);

    let plan_id = plan["plan_id"].as_str().unwrap();
    let (status, stored) = fixture.get(&format!("/api/v1/planning/{}", plan_id)).await;
    assert_eq!(status, 200);
    assert_eq!(stored, plan);

    let (status, list) = fixture.get("/api/v1/planning/").await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = fixture.get("/api/v1/planning/unknown").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["message"], "Plan not found");
}

#[tokio::test]
async fn test_planning_validation_and_suggestions() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/v1/planning/heimstunde",
            json!({ "date": "2026-03-12", "duration": 0, "participant_count": 12 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/v1/planning/heimstunde/suggestions",
            json!({ "date": "2026-03-12", "duration": 60, "participant_count": 10 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["suggested_schedule"].as_array().unwrap().len(), 3);
    assert_eq!(body["difficulty_level"], "medium");
}

// ==================== CONFIG ====================

#[tokio::test]
async fn test_config_endpoints() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/v1/config/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["configured"], false);
    assert_eq!(body["environment"], "test");
    assert_eq!(body["missing_variables"][0], "AZURE_OPENAI_ENDPOINT");

    let (_, body) = fixture.get("/api/v1/config/azure/guide").await;
    assert_eq!(body["steps"].as_array().unwrap().len(), 6);

    let (status, body) = fixture.get("/api/v1/config/azure/test").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);

    let (_, body) = fixture.get("/api/v1/config/env/template").await;
    assert!(body["template"]
        .as_str()
        .unwrap()
        .contains("AZURE_OPENAI_API_KEY=your-azure-openai-api-key"));
    assert_eq!(body["current_status"]["configured"], false);
}

// ==================== TERMINAL CLIENT ====================

#[tokio::test]
async fn test_client_views_against_live_service() {
    let fixture = TestFixture::new().await;
    let api = ApiClient::new(fixture.base_url.clone()).unwrap();

    let mut chat = ChatView::default();
    chat.input = "Wie plane ich eine Heimstunde?".to_string();
    chat.submit(&api).await;
    assert_eq!(chat.transcript().len(), 2);
    assert!(chat.transcript()[1].text.starts_with("Gerne helfe ich dir"));

    let mut search = SearchView::default();
    search.query = "Vertrauen".to_string();
    search.submit(&api).await;
    assert!(!search.results().is_empty());
    assert!(!search.is_loading());
}

#[tokio::test]
async fn test_client_falls_back_on_error_status() {
    let fixture = TestFixture::with_config(|c| c.features.chatbot = false).await;
    let api = ApiClient::new(fixture.base_url.clone()).unwrap();

    let mut chat = ChatView::default();
    chat.input = "Hallo".to_string();
    chat.submit(&api).await;

    assert_eq!(chat.transcript()[0].role, Role::User);
    assert_eq!(chat.transcript()[1].text, FALLBACK);
}

#[tokio::test]
async fn test_client_falls_back_when_unreachable() {
    // Grab a free port and release it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ApiClient::new(format!("http://{}", addr)).unwrap();

    let mut chat = ChatView::default();
    chat.input = "Hallo".to_string();
    chat.submit(&api).await;
    assert_eq!(chat.transcript()[1].text, FALLBACK);

    let mut search = SearchView::default();
    search.query = "knoten".to_string();
    search.submit(&api).await;
    assert!(search.results().is_empty());
    assert!(!search.is_loading());
}
