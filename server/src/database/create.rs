use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{info, warn};

use super::error::DbResult;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `create_tables`.
const SCHEMA_VERSION: i64 = 2;

/// Base schema (version 1).
///
/// Child tables reference their aggregate root with `ON DELETE CASCADE`
/// and the entity they point at with no action, so SQLite itself refuses to
/// delete a product or recipe that is still referenced.
const SCHEMA_V1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            TEXT    PRIMARY KEY,
        name          TEXT    NOT NULL UNIQUE,
        password_hash TEXT    NOT NULL,
        admin         INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id           TEXT    PRIMARY KEY,
        name         TEXT    NOT NULL,
        serving_type TEXT    NOT NULL CHECK (serving_type IN ('grams', 'milliliters', 'units')),
        serving_size TEXT    NOT NULL,
        calories     INTEGER NOT NULL CHECK (calories >= 0),
        created_at   TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS recipes (
        id          TEXT NOT NULL PRIMARY KEY,
        user_id     TEXT NOT NULL,
        name        TEXT NOT NULL,
        image_url   TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS recipe_products (
        recipe_id  TEXT NOT NULL,
        product_id TEXT NOT NULL,
        quantity   TEXT NOT NULL,
        PRIMARY KEY (recipe_id, product_id),
        FOREIGN KEY (recipe_id)  REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (product_id) REFERENCES products(id)
    )",
    "CREATE TABLE IF NOT EXISTS plans (
        id          TEXT NOT NULL PRIMARY KEY,
        user_id     TEXT NOT NULL,
        name        TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS plan_recipes (
        plan_id   TEXT    NOT NULL,
        recipe_id TEXT    NOT NULL,
        quantity  INTEGER NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (plan_id, recipe_id),
        FOREIGN KEY (plan_id)   REFERENCES plans(id) ON DELETE CASCADE,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id)
    )",
    // --- Indexes -----------------------------------------------------------
    "CREATE INDEX IF NOT EXISTS idx_recipes_user            ON recipes(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_plans_user              ON plans(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_recipe_products_product ON recipe_products(product_id)",
    "CREATE INDEX IF NOT EXISTS idx_plan_recipes_recipe     ON plan_recipes(recipe_id)",
];

/// v1 → v2: recipe ratings.
const RATINGS_V2: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS ratings (
        recipe_id  TEXT NOT NULL,
        user_id    TEXT NOT NULL,
        score      TEXT NOT NULL,
        comment    TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (recipe_id, user_id),
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (user_id)   REFERENCES users(id)   ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_ratings_user ON ratings(user_id)",
];

/// Open (creating if needed) the database at `url` and bring the schema up
/// to date.
pub async fn open_database(url: &str, max_connections: u32) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;
    Ok(pool)
}

/// Private in-memory database.
///
/// Every SQLite connection to `:memory:` gets its own database, so the pool
/// is pinned to one connection that is never recycled.
pub async fn open_in_memory() -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> DbResult<()> {
    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}. Running migrations…",
        current_version, SCHEMA_VERSION
    );

    let mut tx = pool.begin().await?;

    if current_version < 1 {
        for stmt in SCHEMA_V1 {
            sqlx::query(*stmt).execute(&mut *tx).await?;
        }
    }

    if current_version < 2 {
        if current_version >= 1 {
            warn!("Migrating schema from v1 to v2 (add ratings)…");
        }
        for stmt in RATINGS_V2 {
            sqlx::query(*stmt).execute(&mut *tx).await?;
        }
    }

    // Add future migration arms here:
    // if current_version < 3 { ... }

    // PRAGMA does not take bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Schema version set to {}.", SCHEMA_VERSION);
    Ok(())
}
