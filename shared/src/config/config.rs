use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::types::server_config::{AppConfig, ConfigError};

/// Shortest signing secret the server will start with.
pub const MIN_JWT_SECRET_LEN: usize = 32;

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path.display());

    parse_config(&contents)
}

/// Parse and validate configuration text.  Split out of [`load_config`] so
/// the SIGHUP reload path and tests share it.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");
    debug!(
        bind = %config.server.addr(),
        database = %config.database.url,
        "Config parsed"
    );

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.bind.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("bind cannot be empty".into()));
    }

    if config.server.port == 0 {
        return Err(ConfigError::InvalidConfig(
            "port must be greater than 0".into(),
        ));
    }

    if config.server.max_body_bytes == 0 {
        return Err(ConfigError::InvalidConfig(
            "max_body_bytes must be greater than 0".into(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.database.url.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "database url cannot be empty".into(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::InvalidConfig(
            "max_connections must be greater than 0".into(),
        ));
    }

    if config.auth.root_admin_name.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "root_admin_name cannot be empty".into(),
        ));
    }

    // Validated here so a bad secret is rejected on SIGHUP reloads too,
    // not at the first login.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
            return Err(ConfigError::InvalidConfig(format!(
                "jwt_secret must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            )));
        }
        _ => {}
    }

    Ok(())
}
