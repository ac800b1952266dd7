use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request bodies larger than this are answered with 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://foodie.db` or `sqlite::memory:`.
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_db_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC key used to sign and verify access tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.
    ///
    /// **Minimum length:** 32 characters.
    /// **Hot-reload safe:** NO. It is read once at startup; rotating it
    /// invalidates every token in circulation.
    pub jwt_secret: Option<String>,

    /// Name of the bootstrap administrator.  This account can never be
    /// deleted.
    #[serde(default = "default_root_admin_name")]
    pub root_admin_name: String,

    /// Password for the bootstrap administrator, used only when the account
    /// does not exist yet.  `ROOT_ADMIN_PASSWORD` takes priority.
    pub root_admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"127.0.0.1:13307"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AuthConfig {
    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        env_or("JWT_SECRET", self.jwt_secret.as_deref())
    }

    pub fn resolved_root_admin_password(&self) -> Option<String> {
        env_or("ROOT_ADMIN_PASSWORD", self.root_admin_password.as_deref())
    }
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.map(str::to_string))
        .filter(|s| !s.is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_db_connections(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            root_admin_name: default_root_admin_name(),
            root_admin_password: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    13307
}

pub fn default_max_body_bytes() -> usize {
    1024 * 1024
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_database_url() -> String {
    "sqlite://foodie.db".to_string()
}

pub fn default_db_connections() -> u32 {
    8
}

pub fn default_root_admin_name() -> String {
    "admin".to_string()
}
