//! SQLite storage for the game catalog and saved Heimstunde plans.

mod catalog;
mod repository;

pub use catalog::seed_games;
pub use repository::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;

/// Schema migrations, applied in order. `meta.schema_version` records how many ran.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE games (
        id TEXT PRIMARY KEY,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        materials TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL,
        min_participants INTEGER NOT NULL,
        max_participants INTEGER NOT NULL,
        age_group TEXT NOT NULL,
        location TEXT NOT NULL,
        weather_dependency TEXT NOT NULL,
        tags TEXT NOT NULL,
        pedagogical_value TEXT NOT NULL,
        source_url TEXT,
        rating REAL
    );
    CREATE INDEX idx_games_position ON games(position);
    "#,
    r#"
    CREATE TABLE plans (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        date TEXT NOT NULL,
        duration INTEGER NOT NULL,
        participant_count INTEGER NOT NULL,
        age_group TEXT NOT NULL,
        theme TEXT,
        location TEXT NOT NULL,
        pedagogical_goals TEXT NOT NULL,
        schedule TEXT NOT NULL,
        material_list TEXT NOT NULL,
        preparation_notes TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX idx_plans_created_at ON plans(created_at);
    "#,
];

/// Open (or create) the database, bring the schema up to date and seed the catalog.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    seed_catalog(&pool).await?;

    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 0,
            catalog_seeded INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        INSERT OR IGNORE INTO meta (id) VALUES (1);
        "#,
    )
    .execute(pool)
    .await?;

    let applied: i64 = sqlx::query_scalar("SELECT schema_version FROM meta WHERE id = 1")
        .fetch_one(pool)
        .await?;

    for (version, sql) in MIGRATIONS.iter().enumerate().skip(applied.max(0) as usize) {
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(sql).execute(&mut *tx).await?;
        sqlx::query("UPDATE meta SET schema_version = ? WHERE id = 1")
            .bind(version as i64 + 1)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(version = version + 1, "Applied schema migration");
    }

    Ok(())
}

/// Insert the built-in catalog once per database.
async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let seeded: i64 = sqlx::query_scalar("SELECT catalog_seeded FROM meta WHERE id = 1")
        .fetch_one(pool)
        .await?;
    if seeded != 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for (position, game) in seed_games().iter().enumerate() {
        repository::insert_game(&mut *tx, position as i64, game).await?;
    }
    sqlx::query("UPDATE meta SET catalog_seeded = 1 WHERE id = 1")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Seeded game catalog with {} games", seed_games().len());
    Ok(())
}
