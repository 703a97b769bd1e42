//! Game catalog endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{bounded_limit, ensure_enabled};
use crate::errors::AppError;
use crate::models::{Game, GameFilters, GameSearchResponse, Location, ScoredGame};
use crate::services::SearchParams;
use crate::AppState;

fn default_age_group() -> Option<String> {
    Some("10-13".to_string())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub duration_max: Option<u32>,
    pub participant_count: Option<u32>,
    pub location: Option<String>,
    #[serde(default = "default_age_group")]
    pub age_group: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    pub limit: Option<u32>,
    pub semantic: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<u32>,
}

/// GET /api/v1/games/search - Filtered, ranked search.
pub async fn search_games(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<GameSearchResponse>, AppError> {
    ensure_enabled(state.config.features.game_search, "Game search")?;

    let limit = bounded_limit(query.limit, 10, 50)?;

    let location = match query.location.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Location::parse(raw).ok_or_else(|| {
            AppError::Validation(format!(
                "location must be indoor, outdoor or both, got '{}'",
                raw
            ))
        })?),
    };

    let tags = query.tags.as_deref().map(|raw| {
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
    });

    let params = SearchParams {
        query: query.q,
        filters: GameFilters {
            duration_max: query.duration_max,
            participant_count: query.participant_count,
            location,
            age_group: query.age_group.filter(|a| !a.trim().is_empty()),
            tags,
        },
        limit: limit as usize,
        semantic: query.semantic.unwrap_or(true),
    };

    Ok(Json(state.games.search(&params).await?))
}

/// GET /api/v1/games/ - Paged catalog listing.
pub async fn list_games(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<GameSearchResponse>, AppError> {
    ensure_enabled(state.config.features.game_search, "Game search")?;

    let limit = bounded_limit(page.limit, 20, 100)?;
    Ok(Json(
        state.games.list(limit, page.offset.unwrap_or(0)).await?,
    ))
}

/// GET /api/v1/games/:id - Get a single game.
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Game>, AppError> {
    ensure_enabled(state.config.features.game_search, "Game search")?;
    Ok(Json(state.games.get(&game_id).await?))
}

/// GET /api/v1/games/:id/similar - Games resembling the given one.
pub async fn similar_games(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<ScoredGame>>, AppError> {
    ensure_enabled(state.config.features.game_search, "Game search")?;

    let limit = bounded_limit(query.limit, 5, 50)?;
    Ok(Json(state.games.similar(&game_id, limit as usize).await?))
}
