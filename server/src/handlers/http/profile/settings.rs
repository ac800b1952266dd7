use bytes::Bytes;
use hyper::Request;
use tracing::{error, info, warn};

use shared::types::PasswordChange;

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;
use crate::handlers::http::utils::{JsonResult, parse_json_body, respond_success};
use crate::security::{Identity, hash_password, verify_password};

use super::delete_account;

/// PATCH /users/me
pub async fn handle_change_password(
    req: Request<Bytes>,
    state: AppState,
    who: Identity,
) -> JsonResult {
    info!("Processing change password request");
    respond_success(change_password(&req, &state, who).await)
}

/// DELETE /users/me
pub async fn handle_delete_me(_req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    info!("Processing account deletion for {}", who.user_id);
    respond_success(delete_account(&state, who.user_id).await)
}

async fn change_password(
    req: &Request<Bytes>,
    state: &AppState,
    who: Identity,
) -> Result<(), ApiError> {
    let change: PasswordChange = parse_json_body(req)?;
    change.validate()?;

    let stored = users::find_by_id(&state.db, who.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let matches = verify_password(&stored.password_hash, &change.old_password).map_err(|e| {
        error!("Stored hash for {} is unreadable: {:#}", who.user_id, e);
        ApiError::Internal
    })?;
    if !matches {
        warn!("Password change rejected for {}: wrong old password", who.user_id);
        return Err(ApiError::BadRequest("old password is incorrect".into()));
    }

    let hash = hash_password(&change.password).map_err(|e| {
        error!("Password hashing failed: {:#}", e);
        ApiError::Internal
    })?;
    users::update_password_hash(&state.db, who.user_id, &hash).await?;

    info!("Password changed successfully for user {}", who.user_id);
    Ok(())
}
