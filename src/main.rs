//! Pfadi AI Assistant
//!
//! REST backend with SQLite persistence, Tantivy game search and Azure OpenAI
//! chat, plus a terminal client for the same API.

mod api;
mod client;
mod config;
mod db;
mod errors;
mod llm;
mod middleware;
mod models;
mod search;
mod services;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use clap::{Parser, Subcommand};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use llm::AzureOpenAiClient;
use search::GameIndex;
use services::{ChatService, GameSearchService};

#[derive(Parser)]
#[command(name = "pfadi-assistant", version, about = "Pfadi AI Assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Open the interactive terminal client
    Shell {
        /// Base URL of the service
        #[arg(long, env = "PFADI_API_URL")]
        api_url: Option<String>,
    },
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub index: Arc<GameIndex>,
    pub games: Arc<GameSearchService>,
    pub chat: Arc<ChatService>,
    pub llm: Option<Arc<AzureOpenAiClient>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open storage, rebuild the search index and wire up the services.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = db::init_database(&config.db_path).await?;
        let repo = Arc::new(Repository::new(pool));

        let index = Arc::new(GameIndex::open(&config.index_path)?);
        tracing::info!("Building search index...");
        let catalog = repo.list_games().await?;
        index.rebuild(&catalog).await?;

        let llm = AzureOpenAiClient::from_config(&config.azure)?.map(Arc::new);
        let games = Arc::new(GameSearchService::new(
            repo.clone(),
            index.clone(),
            llm.clone(),
        ));
        let chat = Arc::new(ChatService::new(llm.clone(), games.clone(), repo.clone()));

        Ok(Self {
            repo,
            index,
            games,
            chat,
            llm,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Shell { api_url } => {
            let base_url = api_url.unwrap_or_else(|| config.api_url.clone());
            tracing::info!(%base_url, "Starting terminal client");
            client::run(client::ApiClient::new(base_url)?).await?;
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Pfadi AI Assistant");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let bind_addr = config.bind_addr;
    let state = AppState::build(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let allowed_hosts = Arc::new(state.config.allowed_hosts.clone());

    let api_routes = Router::new()
        // Health
        .route("/health", get(api::health_check))
        .route("/health/ping", get(api::ping))
        // Chat
        .route("/chat", post(api::chat))
        .route("/chat/status", get(api::chat_status))
        .route("/chat/{conversation_id}", delete(api::clear_conversation))
        .route("/chat/{conversation_id}/history", get(api::chat_history))
        .route("/chat/{conversation_id}/export", post(api::export_conversation))
        // Games
        .route("/games", get(api::list_games))
        .route("/games/", get(api::list_games))
        .route("/games/search", get(api::search_games))
        .route("/games/{game_id}", get(api::get_game))
        .route("/games/{game_id}/similar", get(api::similar_games))
        // Planning
        .route("/planning", get(api::list_plans))
        .route("/planning/", get(api::list_plans))
        .route("/planning/heimstunde", post(api::create_heimstunde_plan))
        .route(
            "/planning/heimstunde/suggestions",
            post(api::plan_suggestions),
        )
        .route("/planning/{plan_id}", get(api::get_plan))
        // Configuration
        .route("/config/status", get(api::config_status))
        .route("/config/azure/guide", get(api::azure_guide))
        .route("/config/azure/test", get(api::azure_test))
        .route("/config/env/template", get(api::env_template));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::liveness))
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(move |req, next| {
            middleware::trusted_host_layer(allowed_hosts.clone(), req, next)
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
