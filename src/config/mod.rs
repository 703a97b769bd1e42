//! Configuration module for the Pfadi assistant.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,http://127.0.0.1:3000,http://localhost:8080";
const DEFAULT_ALLOWED_HOSTS: &str = "localhost,127.0.0.1,0.0.0.0";

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Feature switches exposed through the status endpoints.
#[derive(Debug, Clone)]
pub struct Features {
    pub chatbot: bool,
    pub game_search: bool,
    pub planning: bool,
    pub camp_planning: bool,
    pub communication: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            chatbot: true,
            game_search: true,
            planning: true,
            camp_planning: false,
            communication: false,
        }
    }
}

/// Azure OpenAI and Azure AI Search settings.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub openai_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub chat_deployment: String,
    pub embedding_deployment: String,
    pub api_version: String,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub search_index_name: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            openai_endpoint: None,
            openai_api_key: None,
            chat_deployment: "gpt-4".to_string(),
            embedding_deployment: "text-embedding-ada-002".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            search_endpoint: None,
            search_api_key: None,
            search_index_name: "pfadi-games".to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Deployment environment name (development, production, ...)
    pub environment: String,
    /// Origins allowed by CORS; `*` allows any
    pub cors_origins: Vec<String>,
    /// Values accepted in the `Host` header; `*` allows any
    pub allowed_hosts: Vec<String>,
    pub features: Features,
    pub azure: AzureConfig,
    /// Base URL the terminal client talks to
    pub api_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("PFADI_DB_PATH")
            .unwrap_or_else(|_| "./data/pfadi.sqlite".to_string())
            .into();

        let index_path = env::var("PFADI_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_raw =
            env::var("PFADI_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "PFADI_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let log_level = env::var("PFADI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("PFADI_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    var: "PFADI_LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let environment =
            env::var("PFADI_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cors_origins = split_list(
            &env::var("PFADI_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );
        let allowed_hosts = split_list(
            &env::var("PFADI_ALLOWED_HOSTS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_HOSTS.to_string()),
        );

        let defaults = Features::default();
        let features = Features {
            chatbot: flag("PFADI_ENABLE_CHATBOT", defaults.chatbot)?,
            game_search: flag("PFADI_ENABLE_GAME_SEARCH", defaults.game_search)?,
            planning: flag("PFADI_ENABLE_PLANNING", defaults.planning)?,
            camp_planning: flag("PFADI_ENABLE_CAMP_PLANNING", defaults.camp_planning)?,
            communication: flag("PFADI_ENABLE_COMMUNICATION", defaults.communication)?,
        };

        let azure_defaults = AzureConfig::default();
        let azure = AzureConfig {
            openai_endpoint: non_empty("AZURE_OPENAI_ENDPOINT"),
            openai_api_key: non_empty("AZURE_OPENAI_API_KEY"),
            chat_deployment: non_empty("AZURE_OPENAI_DEPLOYMENT_NAME")
                .unwrap_or(azure_defaults.chat_deployment),
            embedding_deployment: non_empty("AZURE_EMBEDDING_DEPLOYMENT_NAME")
                .unwrap_or(azure_defaults.embedding_deployment),
            api_version: non_empty("AZURE_OPENAI_API_VERSION")
                .unwrap_or(azure_defaults.api_version),
            search_endpoint: non_empty("AZURE_SEARCH_ENDPOINT"),
            search_api_key: non_empty("AZURE_SEARCH_API_KEY"),
            search_index_name: non_empty("AZURE_SEARCH_INDEX_NAME")
                .unwrap_or(azure_defaults.search_index_name),
        };

        let api_url = env::var("PFADI_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_format,
            environment,
            cors_origins,
            allowed_hosts,
            features,
            azure,
            api_url,
        })
    }

    /// Configuration for tests and embedded use: local paths, everything else default.
    #[cfg(test)]
    pub fn for_paths(db_path: PathBuf, index_path: PathBuf) -> Self {
        Self {
            db_path,
            index_path,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            environment: "test".to_string(),
            cors_origins: split_list(DEFAULT_CORS_ORIGINS),
            allowed_hosts: split_list(DEFAULT_ALLOWED_HOSTS),
            features: Features::default(),
            azure: AzureConfig::default(),
            api_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn flag(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}
