//! Account management for administrators.

use bytes::Bytes;
use hyper::Request;
use tracing::info;

use shared::types::{Credentials, User, UserId};

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;
use crate::handlers::http::auth::register::create_account;
use crate::handlers::http::profile::delete_account;
use crate::handlers::http::utils::{
    JsonResult, parse_json_body, path_param, respond, respond_success,
};
use crate::security::Identity;

/// GET /users
pub async fn handle_list_users(_req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    info!("Serving user list");
    respond(users::list_users(&state.db).await.map_err(Into::into))
}

/// POST /users
///
/// Creates an administrator.  Ordinary accounts come from `/register`.
pub async fn handle_create_admin(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(create_admin(&req, &state, who).await)
}

/// GET /users/:id
pub async fn handle_get_user(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(get_user(&req, &state).await)
}

/// DELETE /users/:id
pub async fn handle_delete_user(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond_success(delete_user(&req, &state, who).await)
}

async fn create_admin(
    req: &Request<Bytes>,
    state: &AppState,
    who: Identity,
) -> Result<User, ApiError> {
    let credentials: Credentials = parse_json_body(req)?;
    credentials.validate()?;

    let user = create_account(state, &credentials, true).await?;
    info!("Administrator {} created by {}", user.id, who.user_id);
    Ok(user)
}

async fn get_user(req: &Request<Bytes>, state: &AppState) -> Result<User, ApiError> {
    let id: UserId = path_param(req, "id")?;
    Ok(users::get_user(&state.db, id).await?)
}

async fn delete_user(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<(), ApiError> {
    let id: UserId = path_param(req, "id")?;
    info!("Administrator {} deleting user {}", who.user_id, id);
    delete_account(state, id).await
}
