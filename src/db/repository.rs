//! Database repository for the game catalog and stored plans.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{ActivityPlan, Game, Location, PlanLocation, WeatherDependency};

const GAME_COLUMNS: &str = "id, name, description, materials, duration_minutes, min_participants, max_participants, age_group, location, weather_dependency, tags, pedagogical_value, source_url, rating";

const PLAN_COLUMNS: &str = "id, title, date, duration, participant_count, age_group, theme, location, pedagogical_goals, schedule, material_list, preparation_notes, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Cheap round-trip used by the health endpoint.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== GAME OPERATIONS ====================

    /// List all games in catalog order.
    pub async fn list_games(&self) -> Result<Vec<Game>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY position, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(game_from_row).collect())
    }

    /// List one page of games in catalog order.
    pub async fn list_games_page(&self, limit: u32, offset: u32) -> Result<Vec<Game>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY position, id LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(game_from_row).collect())
    }

    /// Number of games in the catalog.
    pub async fn count_games(&self) -> Result<usize, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Get a game by ID.
    pub async fn get_game(&self, id: &str) -> Result<Option<Game>, AppError> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(game_from_row))
    }

    // ==================== PLAN OPERATIONS ====================

    /// Persist a newly generated plan.
    pub async fn create_plan(&self, plan: &ActivityPlan) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO plans ({PLAN_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&plan.plan_id)
        .bind(&plan.title)
        .bind(plan.date.format("%Y-%m-%d").to_string())
        .bind(i64::from(plan.duration))
        .bind(i64::from(plan.participant_count))
        .bind(&plan.age_group)
        .bind(&plan.theme)
        .bind(plan.location.as_str())
        .bind(serde_json::to_string(&plan.pedagogical_goals)?)
        .bind(serde_json::to_string(&plan.schedule)?)
        .bind(serde_json::to_string(&plan.material_list)?)
        .bind(serde_json::to_string(&plan.preparation_notes)?)
        .bind(plan.created_at.to_rfc3339())
        .bind(plan.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a plan by ID.
    pub async fn get_plan(&self, id: &str) -> Result<Option<ActivityPlan>, AppError> {
        let row = sqlx::query(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(plan_from_row).transpose()
    }

    /// List plans, newest first.
    pub async fn list_plans(&self, limit: u32, offset: u32) -> Result<Vec<ActivityPlan>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(plan_from_row).collect()
    }
}

/// Insert a game row; used when seeding the catalog.
pub(super) async fn insert_game<'e, E>(
    executor: E,
    position: i64,
    game: &Game,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!(
        "INSERT OR IGNORE INTO games (position, {GAME_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(position)
        .bind(&game.game_id)
        .bind(&game.name)
        .bind(&game.description)
        .bind(serde_json::to_string(&game.materials).unwrap_or_default())
        .bind(i64::from(game.duration_minutes))
        .bind(i64::from(game.min_participants))
        .bind(i64::from(game.max_participants))
        .bind(&game.age_group)
        .bind(game.location.as_str())
        .bind(game.weather_dependency.as_str())
        .bind(serde_json::to_string(&game.tags).unwrap_or_default())
        .bind(&game.pedagogical_value)
        .bind(&game.source_url)
        .bind(game.rating.map(f64::from))
        .execute(executor)
        .await?;

    Ok(())
}

// Helper functions for row conversion

fn game_from_row(row: &sqlx::sqlite::SqliteRow) -> Game {
    let materials: String = row.get("materials");
    let tags: String = row.get("tags");
    let location: String = row.get("location");
    let weather: String = row.get("weather_dependency");
    let rating: Option<f64> = row.get("rating");

    Game {
        game_id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        materials: parse_json_array(&materials),
        duration_minutes: row.get::<i64, _>("duration_minutes") as u32,
        min_participants: row.get::<i64, _>("min_participants") as u32,
        max_participants: row.get::<i64, _>("max_participants") as u32,
        age_group: row.get("age_group"),
        location: Location::parse(&location).unwrap_or(Location::Both),
        weather_dependency: WeatherDependency::parse(&weather).unwrap_or(WeatherDependency::Low),
        tags: parse_json_array(&tags),
        pedagogical_value: row.get("pedagogical_value"),
        source_url: row.get("source_url"),
        rating: rating.map(|r| r as f32),
    }
}

fn plan_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityPlan, AppError> {
    let date: String = row.get("date");
    let location: String = row.get("location");
    let goals: String = row.get("pedagogical_goals");
    let schedule: String = row.get("schedule");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ActivityPlan {
        plan_id: row.get("id"),
        title: row.get("title"),
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| AppError::Database(format!("Invalid plan date {}: {}", date, e)))?,
        duration: row.get::<i64, _>("duration") as u32,
        participant_count: row.get::<i64, _>("participant_count") as u32,
        age_group: row.get("age_group"),
        theme: row.get("theme"),
        location: PlanLocation::parse(&location).unwrap_or_default(),
        pedagogical_goals: serde_json::from_str(&goals)?,
        schedule: serde_json::from_str(&schedule)?,
        material_list: parse_json_array(&row.get::<String, _>("material_list")),
        preparation_notes: parse_json_array(&row.get::<String, _>("preparation_notes")),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Invalid timestamp {}: {}", s, e)))
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
