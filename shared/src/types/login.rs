use serde::{Deserialize, Serialize};

use super::user::{User, validate_password};
use super::validation::{ValidationError, require_non_empty};

// ---------------------------------------------------------------------------
// Login / register wire types
// ---------------------------------------------------------------------------

/// Body of `POST /register`, `POST /login` and admin `POST /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(alias = "username")]
    pub name: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_password(&self.password)
    }
}

/// Returned by register and login: the account plus a fresh access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
}
