pub mod bootstrap;
pub mod database;
pub mod error;
pub mod handlers;
pub mod security;
pub mod tower_middle;

use std::sync::Arc;

use sqlx::SqlitePool;

use shared::config::LiveConfig;

use crate::security::TokenCodec;

/// Everything a request handler may touch.  Cloned per request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: Arc<TokenCodec>,
    pub config: LiveConfig,
    /// Captured at startup; a config reload does not change which account
    /// is protected from deletion.
    pub root_admin: Arc<str>,
}

impl AppState {
    pub fn new(db: SqlitePool, tokens: TokenCodec, config: LiveConfig, root_admin: &str) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            config,
            root_admin: Arc::from(root_admin),
        }
    }
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    use shared::types::server_config::AppConfig;

    let db = database::open_in_memory()
        .await
        .expect("in-memory database");
    AppState::new(
        db,
        TokenCodec::new(b"unit-test-secret-unit-test-secret"),
        LiveConfig::new(AppConfig::default()),
        "admin",
    )
}
