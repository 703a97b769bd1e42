//! Terminal client for the assistant service.
//!
//! A shell with three tabs (chat, game search, planning). Each view owns its
//! state and talks to the service through [`AssistantApi`].

mod chat;
mod planning;
mod search;
mod shell;
mod terminal;

pub use chat::*;
pub use planning::*;
pub use search::*;
pub use shell::*;
pub use terminal::run;

use serde::Deserialize;
use serde_json::json;

use crate::models::Location;

/// Errors raised by client calls. Views log these and never show them.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service responded with status {0}")]
    Status(u16),

    /// The response body was not what the client expects.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// A game as listed in search results. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub min_participants: u32,
    pub max_participants: u32,
    pub location: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl GameSummary {
    /// German location label; anything unrecognised reads as outdoors.
    pub fn location_label(&self) -> &'static str {
        Location::parse(&self.location)
            .unwrap_or(Location::Outdoor)
            .label()
    }
}

/// The two service calls the views make.
// Only ever used through generics, so the futures need no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait AssistantApi {
    /// Send a chat message and return the assistant's reply text.
    async fn send_chat(&self, message: &str) -> Result<String, ClientError>;

    /// Search the game catalog.
    async fn search_games(&self, query: &str) -> Result<Vec<GameSummary>, ClientError>;
}

#[derive(Deserialize)]
struct ChatReply {
    message: String,
}

#[derive(Deserialize)]
struct SearchReply {
    games: Vec<GameSummary>,
}

/// HTTP implementation of [`AssistantApi`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl AssistantApi for ApiClient {
    async fn send_chat(&self, message: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/v1/chat", self.base_url))
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Self::decode::<ChatReply>(response).await.map(|r| r.message)
    }

    async fn search_games(&self, query: &str) -> Result<Vec<GameSummary>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/v1/games/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Self::decode::<SearchReply>(response).await.map(|r| r.games)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted [`AssistantApi`] that counts calls.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeApi {
        /// Reply to chat messages; `None` fails with a 500.
        pub chat_reply: Option<String>,
        /// Search results; `None` fails with a transport error.
        pub games: Option<Vec<GameSummary>>,
        pub chat_calls: AtomicUsize,
        pub search_calls: AtomicUsize,
        pub last_message: Mutex<Option<String>>,
    }

    impl FakeApi {
        pub fn chat_calls(&self) -> usize {
            self.chat_calls.load(Ordering::SeqCst)
        }

        pub fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }
    }

    impl AssistantApi for FakeApi {
        async fn send_chat(&self, message: &str) -> Result<String, ClientError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_message.lock().unwrap() = Some(message.to_string());
            self.chat_reply.clone().ok_or(ClientError::Status(500))
        }

        async fn search_games(&self, _query: &str) -> Result<Vec<GameSummary>, ClientError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.games
                .clone()
                .ok_or_else(|| ClientError::Transport("connection refused".to_string()))
        }
    }

    pub fn game(name: &str, location: &str, tags: Option<&[&str]>) -> GameSummary {
        GameSummary {
            name: name.to_string(),
            description: format!("{} Beschreibung", name),
            duration_minutes: 15,
            min_participants: 6,
            max_participants: 12,
            location: location.to_string(),
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
        }
    }
}
