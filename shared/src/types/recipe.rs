use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{ProductId, RecipeId, UserId};
use super::validation::{ValidationError, require_non_empty};

/// A recipe must combine at least this many distinct products.
pub const MIN_RECIPE_PRODUCTS: usize = 2;

/// One product line of a recipe, keyed by `(recipe, product)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeProduct {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

/// Client-supplied fields of a recipe.  The product list is the complete
/// child set: an update replaces whatever was stored before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCore {
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    pub description: String,
    pub products: Vec<RecipeProduct>,
}

impl RecipeCore {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("description", &self.description)?;

        let distinct: HashSet<ProductId> = self.products.iter().map(|p| p.product_id).collect();
        if distinct.len() < MIN_RECIPE_PRODUCTS {
            return Err(ValidationError::new(
                "products",
                format!("at least {} distinct products are required", MIN_RECIPE_PRODUCTS),
            ));
        }

        for (i, line) in self.products.iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(ValidationError::new(
                    format!("products[{}].quantity", i),
                    "must be greater than 0",
                ));
            }
        }
        Ok(())
    }

    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.products.iter().map(|p| p.product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub user_id: UserId,
    pub name: String,
    pub image_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub products: Vec<RecipeProduct>,
}
