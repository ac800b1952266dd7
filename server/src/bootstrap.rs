//! Startup steps shared by the binary and the integration tests.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use shared::types::server_config::{AuthConfig, DatabaseConfig};

use crate::database::{self, users};
use crate::security::hash_password;

/// Open the configured database and bring its schema up to date.
///
/// Any URL naming `:memory:` gets the single-connection in-memory pool.
pub async fn open_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = if config.url.contains(":memory:") {
        database::open_in_memory().await
    } else {
        database::open_database(&config.url, config.max_connections).await
    }
    .with_context(|| format!("Failed to open database {}", config.url))?;

    info!("Database ready: {}", config.url);
    Ok(pool)
}

/// Create the root administrator if it does not exist yet.
///
/// Without a configured root password nothing is created; the server still
/// starts, but only an existing administrator can manage products.
pub async fn ensure_root_admin(db: &SqlitePool, auth: &AuthConfig) -> Result<()> {
    let name = auth.root_admin_name.as_str();

    if users::find_by_name(db, name).await?.is_some() {
        info!("Root administrator {} present", name);
        return Ok(());
    }

    let Some(password) = auth.resolved_root_admin_password() else {
        warn!(
            "Root administrator {} missing and no ROOT_ADMIN_PASSWORD configured",
            name
        );
        return Ok(());
    };

    let hash = hash_password(&password).context("Failed to hash root password")?;
    users::insert_user(db, name, &hash, true)
        .await
        .context("Failed to create root administrator")?;

    info!("Root administrator {} created", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(password: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: None,
            root_admin_name: "root".into(),
            root_admin_password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn root_admin_is_created_once() {
        let db = database::open_in_memory().await.unwrap();

        ensure_root_admin(&db, &auth(Some("s3cret"))).await.unwrap();
        ensure_root_admin(&db, &auth(Some("s3cret"))).await.unwrap();

        let all = users::list_users(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "root");
        assert!(all[0].admin);
    }

    #[tokio::test]
    async fn file_database_is_created_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foodie.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
        };

        let pool = open_pool(&config).await.unwrap();
        users::insert_user(&pool, "alice", "hash", false).await.unwrap();
        pool.close().await;

        let reopened = open_pool(&config).await.unwrap();
        assert!(users::find_by_name(&reopened, "alice").await.unwrap().is_some());
    }
}
