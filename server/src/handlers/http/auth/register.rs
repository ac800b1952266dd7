use bytes::Bytes;
use hyper::Request;
use tracing::{error, info};

use shared::types::{AuthResponse, Credentials, User};

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;
use crate::handlers::http::utils::{JsonResult, parse_json_body, respond};
use crate::security::hash_password;

use super::authorize;

/// POST /register
pub async fn handle_register(req: Request<Bytes>, state: AppState) -> JsonResult {
    info!("Processing registration request");
    respond(register(&req, &state).await)
}

async fn register(req: &Request<Bytes>, state: &AppState) -> Result<AuthResponse, ApiError> {
    let credentials: Credentials = parse_json_body(req)?;
    credentials.validate()?;

    let user = create_account(state, &credentials, false).await?;
    authorize(state, user)
}

/// Hash the password and store a new account.  Shared with the admin
/// endpoint that creates administrators.
pub(crate) async fn create_account(
    state: &AppState,
    credentials: &Credentials,
    admin: bool,
) -> Result<User, ApiError> {
    let hash = hash_password(&credentials.password).map_err(|e| {
        error!("Password hashing failed: {:#}", e);
        ApiError::Internal
    })?;

    Ok(users::insert_user(&state.db, credentials.name.trim(), &hash, admin).await?)
}
