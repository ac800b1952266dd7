//! Seed data shared by the repository tests.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use shared::types::{
    PlanCore, PlanRecipe, ProductCore, ProductId, RecipeCore, RecipeId, RecipeProduct, Serving,
    ServingType, User,
};

use super::{products, users};

pub fn butter() -> ProductCore {
    ProductCore {
        name: "Butter".into(),
        serving: Serving {
            kind: ServingType::Grams,
            size: Decimal::new(125, 1),
            calories: 90,
        },
    }
}

pub async fn user(pool: &SqlitePool, name: &str) -> User {
    users::insert_user(pool, name, "not-a-real-hash", false)
        .await
        .unwrap()
}

pub async fn product(pool: &SqlitePool, name: &str) -> ProductId {
    let mut core = butter();
    core.name = name.to_string();
    products::insert_product(pool, &core).await.unwrap().id
}

pub fn recipe_core(lines: &[(ProductId, i64)]) -> RecipeCore {
    RecipeCore {
        name: "Toast".into(),
        image_url: String::new(),
        description: "Bread with butter".into(),
        products: lines
            .iter()
            .map(|&(product_id, quantity)| RecipeProduct {
                product_id,
                quantity: Decimal::new(quantity, 0),
            })
            .collect(),
    }
}

pub fn plan_core(lines: &[(RecipeId, i64)]) -> PlanCore {
    PlanCore {
        name: "Week".into(),
        description: "Breakfasts".into(),
        recipes: lines
            .iter()
            .map(|&(recipe_id, quantity)| PlanRecipe {
                recipe_id,
                quantity,
            })
            .collect(),
    }
}
