use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PlanId, RecipeId, UserId};
use super::validation::{ValidationError, require_non_empty};

/// How many times a recipe is cooked within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecipe {
    pub recipe_id: RecipeId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCore {
    pub name: String,
    pub description: String,
    pub recipes: Vec<PlanRecipe>,
}

impl PlanCore {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("description", &self.description)?;

        if self.recipes.is_empty() {
            return Err(ValidationError::new("recipes", "at least one recipe is required"));
        }
        for (i, line) in self.recipes.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(ValidationError::new(
                    format!("recipes[{}].quantity", i),
                    "must be greater than 0",
                ));
            }
        }
        Ok(())
    }

    /// Referenced recipes, each once.
    pub fn recipe_ids(&self) -> HashSet<RecipeId> {
        self.recipes.iter().map(|r| r.recipe_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub recipes: Vec<PlanRecipe>,
}
