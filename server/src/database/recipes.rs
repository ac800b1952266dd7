//! Recipe aggregate: a `recipes` row plus its `recipe_products` lines.
//!
//! Writes go through one transaction each.  Product references are checked
//! by the `recipe_products.product_id` foreign key; a violation rolls the
//! whole write back and surfaces as `MissingDependency("product")`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use shared::types::{Recipe, RecipeCore, RecipeId, RecipeProduct, UserId};

use super::error::{DbError, DbResult, on_foreign_key, parse_column, parse_decimal};

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: String,
    user_id: String,
    name: String,
    image_url: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RecipeProductRow {
    product_id: String,
    quantity: String,
}

impl TryFrom<RecipeProductRow> for RecipeProduct {
    type Error = DbError;

    fn try_from(row: RecipeProductRow) -> DbResult<Self> {
        Ok(Self {
            product_id: parse_column("recipe_products.product_id", &row.product_id)?,
            quantity: parse_decimal("recipe_products.quantity", &row.quantity)?,
        })
    }
}

const SELECT_RECIPE: &str =
    "SELECT id, user_id, name, image_url, description, created_at FROM recipes";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

async fn load_products(pool: &SqlitePool, recipe_id: &str) -> DbResult<Vec<RecipeProduct>> {
    sqlx::query_as::<_, RecipeProductRow>(
        "SELECT product_id, quantity FROM recipe_products
         WHERE recipe_id = ?
         ORDER BY rowid",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(RecipeProduct::try_from)
    .collect()
}

async fn assemble(pool: &SqlitePool, row: RecipeRow) -> DbResult<Recipe> {
    let products = load_products(pool, &row.id).await?;
    Ok(Recipe {
        id: parse_column("recipes.id", &row.id)?,
        user_id: parse_column("recipes.user_id", &row.user_id)?,
        name: row.name,
        image_url: row.image_url,
        description: row.description,
        created_at: row.created_at,
        products,
    })
}

async fn assemble_all(pool: &SqlitePool, rows: Vec<RecipeRow>) -> DbResult<Vec<Recipe>> {
    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        recipes.push(assemble(pool, row).await?);
    }
    Ok(recipes)
}

pub async fn get_recipe(pool: &SqlitePool, id: RecipeId) -> DbResult<Recipe> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!("{SELECT_RECIPE} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound("recipe"))?;

    assemble(pool, row).await
}

pub async fn list_recipes(pool: &SqlitePool) -> DbResult<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!("{SELECT_RECIPE} ORDER BY rowid"))
        .fetch_all(pool)
        .await?;

    assemble_all(pool, rows).await
}

pub async fn list_by_owner(pool: &SqlitePool, owner: UserId) -> DbResult<Vec<Recipe>> {
    let rows =
        sqlx::query_as::<_, RecipeRow>(&format!("{SELECT_RECIPE} WHERE user_id = ? ORDER BY rowid"))
            .bind(owner.to_string())
            .fetch_all(pool)
            .await?;

    assemble_all(pool, rows).await
}

/// Owner of a recipe, for authorization checks.
pub async fn owner_of(pool: &SqlitePool, id: RecipeId) -> DbResult<UserId> {
    let owner: String = sqlx::query_scalar("SELECT user_id FROM recipes WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound("recipe"))?;

    parse_column("recipes.user_id", &owner)
}

/// First id in `ids` with no stored recipe, if any.
pub async fn first_missing(
    pool: &SqlitePool,
    ids: impl IntoIterator<Item = RecipeId>,
) -> DbResult<Option<RecipeId>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = ?)")
            .bind(id.to_string())
            .fetch_one(pool)
            .await?;
        if exists == 0 {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert or overwrite each line.  A product listed twice keeps the last
/// quantity.
async fn upsert_products(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    lines: &[RecipeProduct],
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            "INSERT INTO recipe_products (recipe_id, product_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (recipe_id, product_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(recipe_id)
        .bind(line.product_id.to_string())
        .bind(line.quantity.normalize().to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| on_foreign_key(e, DbError::MissingDependency("product")))?;
    }
    Ok(())
}

pub async fn insert_recipe(pool: &SqlitePool, owner: UserId, core: &RecipeCore) -> DbResult<Recipe> {
    let id = RecipeId::generate();
    let id_str = id.to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO recipes (id, user_id, name, image_url, description, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id_str)
    .bind(owner.to_string())
    .bind(&core.name)
    .bind(&core.image_url)
    .bind(&core.description)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| on_foreign_key(e, DbError::MissingDependency("user")))?;

    upsert_products(&mut tx, &id_str, &core.products).await?;

    tx.commit().await?;

    info!("Recipe created: {} (ID: {}, owner: {})", core.name, id, owner);
    get_recipe(pool, id).await
}

/// Replace a recipe's fields and its complete product set.
///
/// Old lines are deleted and the new set inserted inside the same
/// transaction, so readers see either the old set or the new one.
pub async fn update_recipe(pool: &SqlitePool, id: RecipeId, core: &RecipeCore) -> DbResult<Recipe> {
    let id_str = id.to_string();

    let mut tx = pool.begin().await?;

    let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = ?)")
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Err(DbError::NotFound("recipe"));
    }

    sqlx::query("DELETE FROM recipe_products WHERE recipe_id = ?")
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

    upsert_products(&mut tx, &id_str, &core.products).await?;

    sqlx::query("UPDATE recipes SET name = ?, image_url = ?, description = ? WHERE id = ?")
        .bind(&core.name)
        .bind(&core.image_url)
        .bind(&core.description)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Recipe updated: {}", id);
    get_recipe(pool, id).await
}

/// Delete a recipe with its lines and ratings.  A plan that still lists it
/// makes the foreign key fail, reported as `InUse`.
pub async fn delete_recipe(pool: &SqlitePool, id: RecipeId) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| on_foreign_key(e, DbError::InUse("recipe")))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("recipe"));
    }

    info!("Recipe deleted: {}", id);
    Ok(())
}
