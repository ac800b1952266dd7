use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use shared::types::{User, UserId};

use super::error::{DbError, DbResult, on_foreign_key, on_unique, parse_column};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    password_hash: String,
    admin: i64,
    created_at: DateTime<Utc>,
}

/// A user together with the stored argon2 hash.  Only the login and
/// password-change paths ever need the hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

impl TryFrom<UserRow> for StoredUser {
    type Error = DbError;

    fn try_from(row: UserRow) -> DbResult<Self> {
        Ok(Self {
            user: User {
                id: parse_column("users.id", &row.id)?,
                name: row.name,
                admin: row.admin != 0,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

const SELECT_USER: &str = "SELECT id, name, password_hash, admin, created_at FROM users";

pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    password_hash: &str,
    admin: bool,
) -> DbResult<User> {
    let user = User {
        id: UserId::generate(),
        name: name.to_string(),
        admin,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, name, password_hash, admin, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id.to_string())
    .bind(&user.name)
    .bind(password_hash)
    .bind(user.admin)
    .bind(user.created_at)
    .execute(pool)
    .await
    .map_err(|e| on_unique(e, "user"))?;

    info!("User created: {} (ID: {}, admin: {})", user.name, user.id, user.admin);
    Ok(user)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> DbResult<Option<StoredUser>> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE name = ?"))
        .bind(name)
        .fetch_optional(pool)
        .await?
        .map(StoredUser::try_from)
        .transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: UserId) -> DbResult<Option<StoredUser>> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .map(StoredUser::try_from)
        .transpose()
}

pub async fn get_user(pool: &SqlitePool, id: UserId) -> DbResult<User> {
    find_by_id(pool, id)
        .await?
        .map(|stored| stored.user)
        .ok_or(DbError::NotFound("user"))
}

/// Existence check used by the authentication gate on every protected
/// request.
pub async fn user_exists(pool: &SqlitePool, id: UserId) -> DbResult<bool> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(exists != 0)
}

pub async fn list_users(pool: &SqlitePool) -> DbResult<Vec<User>> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY rowid"))
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StoredUser::try_from(row).map(|stored| stored.user))
        .collect()
}

pub async fn update_password_hash(
    pool: &SqlitePool,
    id: UserId,
    password_hash: &str,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("user"));
    }
    Ok(())
}

/// Delete a user and, by cascade, their recipes, plans and ratings.
///
/// Fails with `InUse` when one of the user's recipes is still part of
/// somebody else's plan.
pub async fn delete_user(pool: &SqlitePool, id: UserId) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| on_foreign_key(e, DbError::InUse("user")))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound("user"));
    }

    info!("User deleted: {}", id);
    Ok(())
}
