use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use shared::types::{Rating, RatingCore, RecipeId, UserId};

use super::error::{DbError, DbResult, parse_column, parse_decimal};

#[derive(sqlx::FromRow)]
struct RatingRow {
    recipe_id: String,
    user_id: String,
    score: String,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = DbError;

    fn try_from(row: RatingRow) -> DbResult<Self> {
        Ok(Self {
            recipe_id: parse_column("ratings.recipe_id", &row.recipe_id)?,
            user_id: parse_column("ratings.user_id", &row.user_id)?,
            score: parse_decimal("ratings.score", &row.score)?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// Record `user`'s rating of `recipe`.  Each user rates a recipe once.
pub async fn insert_rating(
    pool: &SqlitePool,
    recipe: RecipeId,
    user: UserId,
    core: &RatingCore,
) -> DbResult<Rating> {
    let rating = Rating {
        recipe_id: recipe,
        user_id: user,
        score: core.score.normalize(),
        comment: core.comment.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO ratings (recipe_id, user_id, score, comment, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(recipe.to_string())
    .bind(user.to_string())
    .bind(rating.score.to_string())
    .bind(&rating.comment)
    .bind(rating.created_at)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            DbError::NotFound("recipe")
        }
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::Duplicate("rating"),
        other => DbError::Sqlx(other),
    })?;

    info!("Recipe {} rated {} by {}", recipe, rating.score, user);
    Ok(rating)
}

pub async fn list_for_recipe(pool: &SqlitePool, recipe: RecipeId) -> DbResult<Vec<Rating>> {
    sqlx::query_as::<_, RatingRow>(
        "SELECT recipe_id, user_id, score, comment, created_at FROM ratings
         WHERE recipe_id = ?
         ORDER BY rowid",
    )
    .bind(recipe.to_string())
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(Rating::try_from)
    .collect()
}

/// Replace the score and comment of `user`'s existing rating of `recipe`.
pub async fn update_rating(
    pool: &SqlitePool,
    recipe: RecipeId,
    user: UserId,
    core: &RatingCore,
) -> DbResult<Rating> {
    let result = sqlx::query(
        "UPDATE ratings SET score = ?, comment = ?
         WHERE recipe_id = ? AND user_id = ?",
    )
    .bind(core.score.normalize().to_string())
    .bind(&core.comment)
    .bind(recipe.to_string())
    .bind(user.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("rating"));
    }

    let row = sqlx::query_as::<_, RatingRow>(
        "SELECT recipe_id, user_id, score, comment, created_at FROM ratings
         WHERE recipe_id = ? AND user_id = ?",
    )
    .bind(recipe.to_string())
    .bind(user.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound("rating"))?;

    info!("Rating of recipe {} by {} updated", recipe, user);
    Rating::try_from(row)
}

pub async fn delete_rating(pool: &SqlitePool, recipe: RecipeId, user: UserId) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM ratings WHERE recipe_id = ? AND user_id = ?")
        .bind(recipe.to_string())
        .bind(user.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("rating"));
    }
    Ok(())
}
