use bytes::Bytes;
use hyper::Request;
use tracing::{error, info, warn};

use shared::types::{AuthResponse, Credentials};

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;
use crate::handlers::http::utils::{JsonResult, parse_json_body, respond};
use crate::security::verify_password;

use super::authorize;

/// POST /login
pub async fn handle_login(req: Request<Bytes>, state: AppState) -> JsonResult {
    info!("Processing login request");
    respond(login(&req, &state).await)
}

async fn login(req: &Request<Bytes>, state: &AppState) -> Result<AuthResponse, ApiError> {
    let credentials: Credentials = parse_json_body(req)?;

    // Unknown name and wrong password look the same to the caller.
    let Some(stored) = users::find_by_name(&state.db, credentials.name.trim()).await? else {
        warn!("Login failed: unknown user {}", credentials.name);
        return Err(ApiError::Unauthorized);
    };

    let matches = verify_password(&stored.password_hash, &credentials.password).map_err(|e| {
        error!("Stored hash for {} is unreadable: {:#}", stored.user.id, e);
        ApiError::Internal
    })?;
    if !matches {
        warn!("Login failed: wrong password for {}", stored.user.id);
        return Err(ApiError::Unauthorized);
    }

    info!("User logged in: {} (ID: {})", stored.user.name, stored.user.id);
    authorize(state, stored.user)
}
