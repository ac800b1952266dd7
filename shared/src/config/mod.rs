pub mod config;

pub use self::config::{load_config, parse_config};

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::server_config::AppConfig;

/// A cheaply-cloneable, live config handle.
///
/// All clones share the same underlying `RwLock<AppConfig>`, so a call to
/// [`LiveConfig::reload`] is visible to every request handler holding a
/// clone.  Settings that are baked into long-lived objects at startup (the
/// signing secret, the database URL) are not affected by a reload.
///
/// ```rust,no_run
/// // Copy values out; never hold the guard across an .await
/// // let limit = state.config.read().await.server.max_body_bytes;
/// ```
#[derive(Clone, Debug)]
pub struct LiveConfig(Arc<RwLock<AppConfig>>);

impl LiveConfig {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    /// Acquire a read guard. Keep it short-lived; never hold across `.await`.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.0.read().await
    }

    /// Swap in a new config. Existing clones see it on their next `.read()`.
    pub async fn reload(&self, new: AppConfig) {
        *self.0.write().await = new;
    }
}
