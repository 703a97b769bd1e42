//! Heimstunde planning endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use super::{bounded_limit, ensure_enabled, PageQuery};
use crate::errors::AppError;
use crate::models::{ActivityPlan, PlanSuggestion, PlanningRequest};
use crate::services::planning;
use crate::AppState;

fn validate(request: &PlanningRequest) -> Result<(), AppError> {
    if request.duration == 0 {
        return Err(AppError::Validation(
            "duration must be greater than 0".to_string(),
        ));
    }
    if request.participant_count == 0 {
        return Err(AppError::Validation(
            "participant_count must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/planning/heimstunde - Generate and store a plan.
pub async fn create_heimstunde_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanningRequest>,
) -> Result<Json<ActivityPlan>, AppError> {
    ensure_enabled(state.config.features.planning, "Planning")?;
    validate(&request)?;

    let plan = planning::build_heimstunde_plan(&request, Utc::now());
    state.repo.create_plan(&plan).await?;

    tracing::info!(
        plan_id = %plan.plan_id,
        duration = plan.duration,
        items = plan.schedule.len(),
        "Heimstunde plan created"
    );
    Ok(Json(plan))
}

/// POST /api/v1/planning/heimstunde/suggestions - Suggested schedule.
pub async fn plan_suggestions(
    State(state): State<AppState>,
    Json(request): Json<PlanningRequest>,
) -> Result<Json<PlanSuggestion>, AppError> {
    ensure_enabled(state.config.features.planning, "Planning")?;
    validate(&request)?;
    Ok(Json(planning::suggestions()))
}

/// GET /api/v1/planning/:id - Get a stored plan.
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<ActivityPlan>, AppError> {
    state
        .repo
        .get_plan(&plan_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))
}

/// GET /api/v1/planning/ - List stored plans, newest first.
pub async fn list_plans(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<ActivityPlan>>, AppError> {
    let limit = bounded_limit(page.limit, 20, 100)?;
    Ok(Json(
        state
            .repo
            .list_plans(limit, page.offset.unwrap_or(0))
            .await?,
    ))
}
