pub mod login;
pub mod register;

pub use login::handle_login;
pub use register::handle_register;

use chrono::Utc;

use shared::types::{AuthResponse, User};

use crate::AppState;
use crate::error::ApiError;

/// Pair a user with a freshly issued access token.
pub(crate) fn authorize(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let access_token = state.tokens.issue(user.id, user.admin, Utc::now())?;
    Ok(AuthResponse { user, access_token })
}
