use sqlx::SqlitePool;

use shared::types::{ProductId, RecipeId};

use super::error::DbResult;

/// An entity that other aggregates may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTarget {
    /// Referenced by recipe lines.
    Product(ProductId),
    /// Referenced by plan lines.
    Recipe(RecipeId),
}

impl UsageTarget {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Product(_) => "product",
            Self::Recipe(_) => "recipe",
        }
    }
}

/// `true` when nothing references `target`.
///
/// This is advisory: a reference added between this check and the delete is
/// still caught by the foreign key, just with a less specific error.
pub async fn can_delete(pool: &SqlitePool, target: UsageTarget) -> DbResult<bool> {
    let (sql, id) = match target {
        UsageTarget::Product(id) => (
            "SELECT EXISTS (SELECT 1 FROM recipe_products WHERE product_id = ?)",
            id.to_string(),
        ),
        UsageTarget::Recipe(id) => (
            "SELECT EXISTS (SELECT 1 FROM plan_recipes WHERE recipe_id = ?)",
            id.to_string(),
        ),
    };

    let in_use: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(pool).await?;
    Ok(in_use == 0)
}
