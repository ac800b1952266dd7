//! Plan aggregate: a `plans` row plus its `plan_recipes` lines.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use shared::types::{Plan, PlanCore, PlanId, PlanRecipe, UserId};

use super::error::{DbError, DbResult, on_foreign_key, parse_column};

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    user_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PlanRecipeRow {
    recipe_id: String,
    quantity: i64,
}

const SELECT_PLAN: &str = "SELECT id, user_id, name, description, created_at FROM plans";

async fn load_recipes(pool: &SqlitePool, plan_id: &str) -> DbResult<Vec<PlanRecipe>> {
    sqlx::query_as::<_, PlanRecipeRow>(
        "SELECT recipe_id, quantity FROM plan_recipes
         WHERE plan_id = ?
         ORDER BY rowid",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| -> DbResult<PlanRecipe> {
        Ok(PlanRecipe {
            recipe_id: parse_column("plan_recipes.recipe_id", &row.recipe_id)?,
            quantity: row.quantity,
        })
    })
    .collect()
}

async fn assemble(pool: &SqlitePool, rows: Vec<PlanRow>) -> DbResult<Vec<Plan>> {
    let mut plans = Vec::with_capacity(rows.len());
    for row in rows {
        let recipes = load_recipes(pool, &row.id).await?;
        plans.push(Plan {
            id: parse_column("plans.id", &row.id)?,
            user_id: parse_column("plans.user_id", &row.user_id)?,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            recipes,
        });
    }
    Ok(plans)
}

pub async fn get_plan(pool: &SqlitePool, id: PlanId) -> DbResult<Plan> {
    let row = sqlx::query_as::<_, PlanRow>(&format!("{SELECT_PLAN} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound("plan"))?;

    assemble(pool, vec![row])
        .await?
        .pop()
        .ok_or(DbError::NotFound("plan"))
}

pub async fn list_plans(pool: &SqlitePool) -> DbResult<Vec<Plan>> {
    let rows = sqlx::query_as::<_, PlanRow>(&format!("{SELECT_PLAN} ORDER BY rowid"))
        .fetch_all(pool)
        .await?;
    assemble(pool, rows).await
}

pub async fn list_by_owner(pool: &SqlitePool, owner: UserId) -> DbResult<Vec<Plan>> {
    let rows =
        sqlx::query_as::<_, PlanRow>(&format!("{SELECT_PLAN} WHERE user_id = ? ORDER BY rowid"))
            .bind(owner.to_string())
            .fetch_all(pool)
            .await?;
    assemble(pool, rows).await
}

pub async fn owner_of(pool: &SqlitePool, id: PlanId) -> DbResult<UserId> {
    let owner: String = sqlx::query_scalar("SELECT user_id FROM plans WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound("plan"))?;

    parse_column("plans.user_id", &owner)
}

async fn upsert_recipes(
    conn: &mut SqliteConnection,
    plan_id: &str,
    lines: &[PlanRecipe],
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            "INSERT INTO plan_recipes (plan_id, recipe_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (plan_id, recipe_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(plan_id)
        .bind(line.recipe_id.to_string())
        .bind(line.quantity)
        .execute(&mut *conn)
        .await
        .map_err(|e| on_foreign_key(e, DbError::MissingDependency("recipe")))?;
    }
    Ok(())
}

pub async fn insert_plan(pool: &SqlitePool, owner: UserId, core: &PlanCore) -> DbResult<Plan> {
    let id = PlanId::generate();
    let id_str = id.to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO plans (id, user_id, name, description, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id_str)
    .bind(owner.to_string())
    .bind(&core.name)
    .bind(&core.description)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| on_foreign_key(e, DbError::MissingDependency("user")))?;

    upsert_recipes(&mut tx, &id_str, &core.recipes).await?;

    tx.commit().await?;

    info!("Plan created: {} (ID: {}, owner: {})", core.name, id, owner);
    get_plan(pool, id).await
}

pub async fn update_plan(pool: &SqlitePool, id: PlanId, core: &PlanCore) -> DbResult<Plan> {
    let id_str = id.to_string();

    let mut tx = pool.begin().await?;

    let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM plans WHERE id = ?)")
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Err(DbError::NotFound("plan"));
    }

    sqlx::query("DELETE FROM plan_recipes WHERE plan_id = ?")
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

    upsert_recipes(&mut tx, &id_str, &core.recipes).await?;

    sqlx::query("UPDATE plans SET name = ?, description = ? WHERE id = ?")
        .bind(&core.name)
        .bind(&core.description)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Plan updated: {}", id);
    get_plan(pool, id).await
}

pub async fn delete_plan(pool: &SqlitePool, id: PlanId) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM plans WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("plan"));
    }

    info!("Plan deleted: {}", id);
    Ok(())
}
