//! Game search: filtering, semantic ranking and full-text fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::db::Repository;
use crate::errors::AppError;
use crate::llm::{cosine_similarity, AzureOpenAiClient, LlmError};
use crate::models::{Game, GameFilters, GameSearchResponse, ScoredGame, SearchType};
use crate::search::GameIndex;

/// Parameters of a single catalog search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: Option<String>,
    pub filters: GameFilters,
    pub limit: usize,
    pub semantic: bool,
}

pub struct GameSearchService {
    repo: Arc<Repository>,
    index: Arc<GameIndex>,
    llm: Option<Arc<AzureOpenAiClient>>,
    /// Game embeddings keyed by game id.
    embeddings: RwLock<HashMap<String, Vec<f32>>>,
}

impl GameSearchService {
    pub fn new(
        repo: Arc<Repository>,
        index: Arc<GameIndex>,
        llm: Option<Arc<AzureOpenAiClient>>,
    ) -> Self {
        Self {
            repo,
            index,
            llm,
            embeddings: RwLock::new(HashMap::new()),
        }
    }

    /// Search the catalog. Filters apply first, then the query ranks what is left.
    pub async fn search(&self, params: &SearchParams) -> Result<GameSearchResponse, AppError> {
        let started = Instant::now();

        let catalog = self.repo.list_games().await?;
        let catalog_size = catalog.len();
        let candidates: Vec<Game> = catalog
            .into_iter()
            .filter(|g| params.filters.matches(g))
            .collect();

        let query = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let (ranked, search_type) = match query {
            None => (unscored(candidates), SearchType::FilterOnly),
            Some(query) => match (&self.llm, params.semantic) {
                (Some(llm), true) => match self.rank_semantic(llm, query, candidates.clone()).await
                {
                    Ok(ranked) => (ranked, SearchType::Semantic),
                    Err(e) => {
                        tracing::warn!(error = %e, "Semantic search failed, falling back to keyword order");
                        (unscored(candidates), SearchType::KeywordFallback)
                    }
                },
                _ => (
                    self.rank_text(query, candidates, catalog_size)?,
                    SearchType::TextMatch,
                ),
            },
        };

        let total_found = ranked.len();
        let games: Vec<ScoredGame> = ranked.into_iter().take(params.limit).collect();
        let query_time_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            query = query.unwrap_or_default(),
            ?search_type,
            total_found,
            returned = games.len(),
            query_time_ms,
            "Game search completed"
        );

        Ok(GameSearchResponse {
            games,
            total_found,
            query_time_ms,
            search_type,
        })
    }

    /// One page of the catalog.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<GameSearchResponse, AppError> {
        let started = Instant::now();
        let games = self.repo.list_games_page(limit, offset).await?;
        let total_found = self.repo.count_games().await?;

        Ok(GameSearchResponse {
            games: unscored(games),
            total_found,
            query_time_ms: started.elapsed().as_millis() as u64,
            search_type: SearchType::List,
        })
    }

    pub async fn get(&self, game_id: &str) -> Result<Game, AppError> {
        self.repo
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    /// Games resembling `game_id`, using its description and tags as the query.
    pub async fn similar(&self, game_id: &str, limit: usize) -> Result<Vec<ScoredGame>, AppError> {
        let target = self.get(game_id).await?;
        let params = SearchParams {
            query: Some(format!("{} {}", target.description, target.tags.join(" "))),
            filters: GameFilters::default(),
            limit: limit + 1,
            semantic: true,
        };

        let response = self.search(&params).await?;
        Ok(response
            .games
            .into_iter()
            .filter(|g| g.game.game_id != game_id)
            .take(limit)
            .collect())
    }

    async fn rank_semantic(
        &self,
        llm: &AzureOpenAiClient,
        query: &str,
        candidates: Vec<Game>,
    ) -> Result<Vec<ScoredGame>, LlmError> {
        let query_embedding = llm.embedding(query).await?;

        let mut ranked = Vec::with_capacity(candidates.len());
        for game in candidates {
            let embedding = self.game_embedding(llm, &game).await?;
            let score = cosine_similarity(&query_embedding, &embedding);
            ranked.push(ScoredGame {
                game,
                search_score: Some(score),
            });
        }

        ranked.sort_by(|a, b| {
            b.search_score
                .partial_cmp(&a.search_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(ranked)
    }

    async fn game_embedding(
        &self,
        llm: &AzureOpenAiClient,
        game: &Game,
    ) -> Result<Vec<f32>, LlmError> {
        if let Some(cached) = self.embeddings.read().await.get(&game.game_id) {
            return Ok(cached.clone());
        }
        let embedding = llm.embedding(&game.search_text()).await?;
        self.embeddings
            .write()
            .await
            .insert(game.game_id.clone(), embedding.clone());
        Ok(embedding)
    }

    fn rank_text(
        &self,
        query: &str,
        candidates: Vec<Game>,
        catalog_size: usize,
    ) -> Result<Vec<ScoredGame>, AppError> {
        let hits = self.index.search(query, catalog_size)?;

        let mut by_id: HashMap<String, Game> = candidates
            .into_iter()
            .map(|g| (g.game_id.clone(), g))
            .collect();

        // Hits arrive best first; only filtered candidates survive.
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                by_id.remove(&hit.game_id).map(|game| ScoredGame {
                    game,
                    search_score: Some(hit.score),
                })
            })
            .collect())
    }
}

fn unscored(games: Vec<Game>) -> Vec<ScoredGame> {
    games
        .into_iter()
        .map(|game| ScoredGame {
            game,
            search_score: None,
        })
        .collect()
}
