use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use shared::types::{Product, ProductCore, ProductId, Serving};

use super::error::{DbError, DbResult, on_foreign_key, parse_column, parse_decimal};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    serving_type: String,
    serving_size: String,
    calories: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Self {
            id: parse_column("products.id", &row.id)?,
            name: row.name,
            serving: Serving {
                kind: parse_column("products.serving_type", &row.serving_type)?,
                size: parse_decimal("products.serving_size", &row.serving_size)?,
                calories: row.calories,
            },
            created_at: row.created_at,
        })
    }
}

const SELECT_PRODUCT: &str =
    "SELECT id, name, serving_type, serving_size, calories, created_at FROM products";

pub async fn insert_product(pool: &SqlitePool, core: &ProductCore) -> DbResult<Product> {
    let product = Product {
        id: ProductId::generate(),
        name: core.name.clone(),
        serving: core.serving.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO products (id, name, serving_type, serving_size, calories, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id.to_string())
    .bind(&product.name)
    .bind(product.serving.kind.as_str())
    .bind(product.serving.size.to_string())
    .bind(product.serving.calories)
    .bind(product.created_at)
    .execute(pool)
    .await?;

    info!("Product created: {} (ID: {})", product.name, product.id);
    Ok(product)
}

pub async fn get_product(pool: &SqlitePool, id: ProductId) -> DbResult<Product> {
    sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound("product"))?
        .try_into()
}

pub async fn list_products(pool: &SqlitePool) -> DbResult<Vec<Product>> {
    sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} ORDER BY rowid"))
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect()
}

/// Full replace of a product's fields; id and creation time are kept.
pub async fn update_product(
    pool: &SqlitePool,
    id: ProductId,
    core: &ProductCore,
) -> DbResult<Product> {
    let result = sqlx::query(
        "UPDATE products
         SET name = ?, serving_type = ?, serving_size = ?, calories = ?
         WHERE id = ?",
    )
    .bind(&core.name)
    .bind(core.serving.kind.as_str())
    .bind(core.serving.size.to_string())
    .bind(core.serving.calories)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("product"));
    }

    info!("Product updated: {}", id);
    get_product(pool, id).await
}

/// Delete a product.  A recipe line that still points at it makes the
/// foreign key fail, reported as `InUse`.
pub async fn delete_product(pool: &SqlitePool, id: ProductId) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| on_foreign_key(e, DbError::InUse("product")))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("product"));
    }

    info!("Product deleted: {}", id);
    Ok(())
}

/// First id in `ids` with no stored product, if any.
pub async fn first_missing(
    pool: &SqlitePool,
    ids: impl IntoIterator<Item = ProductId>,
) -> DbResult<Option<ProductId>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = ?)")
                .bind(id.to_string())
                .fetch_one(pool)
                .await?;
        if exists == 0 {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::butter;
    use crate::database::open_in_memory;
    use rust_decimal::Decimal;
    use shared::types::ServingType;

    #[tokio::test]
    async fn decimal_size_survives_storage() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_product(&pool, &butter()).await.unwrap();

        let fetched = get_product(&pool, created.id).await.unwrap();
        assert_eq!(fetched.serving.size, Decimal::new(125, 1));
        assert_eq!(fetched.serving.kind, ServingType::Grams);
    }

    #[tokio::test]
    async fn update_replaces_every_field() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_product(&pool, &butter()).await.unwrap();

        let mut core = butter();
        core.name = "Margarine".into();
        core.serving.kind = ServingType::Units;
        core.serving.calories = 0;
        let updated = update_product(&pool, created.id, &core).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Margarine");
        assert_eq!(updated.serving.kind, ServingType::Units);
        assert_eq!(updated.serving.calories, 0);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let pool = open_in_memory().await.unwrap();
        let id = ProductId::generate();
        assert!(matches!(get_product(&pool, id).await, Err(DbError::NotFound("product"))));
        assert!(matches!(
            update_product(&pool, id, &butter()).await,
            Err(DbError::NotFound("product"))
        ));
        assert!(matches!(delete_product(&pool, id).await, Err(DbError::NotFound("product"))));
    }

    #[tokio::test]
    async fn first_missing_reports_unknown_id() {
        let pool = open_in_memory().await.unwrap();
        let known = insert_product(&pool, &butter()).await.unwrap().id;
        let unknown = ProductId::generate();

        assert_eq!(first_missing(&pool, [known, known]).await.unwrap(), None);
        assert_eq!(
            first_missing(&pool, [known, unknown]).await.unwrap(),
            Some(unknown)
        );
    }
}
