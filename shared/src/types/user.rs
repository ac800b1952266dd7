use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::validation::ValidationError;

/// Shortest password accepted on registration or password change.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Public view of an account.  The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `PATCH /users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.old_password.is_empty() {
            return Err(ValidationError::new("old_password", "must not be empty"));
        }
        validate_password(&self.password)
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}
