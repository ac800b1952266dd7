use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{RecipeId, UserId};
use super::validation::{ValidationError, require_non_empty};

pub const MAX_SCORE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Body of `POST` and `PATCH /recipes/:id/ratings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCore {
    pub score: Decimal,
    pub comment: String,
}

impl RatingCore {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.score < Decimal::ZERO || self.score > MAX_SCORE {
            return Err(ValidationError::new(
                "score",
                format!("must be between 0 and {}", MAX_SCORE),
            ));
        }
        require_non_empty("comment", &self.comment)
    }
}

/// A user's single rating of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub score: Decimal,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
