use bytes::Bytes;
use hyper::Request;

use crate::AppState;
use crate::database::users;
use crate::handlers::http::utils::{JsonResult, respond};
use crate::security::Identity;

/// GET /users/me
pub async fn handle_get_me(_req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(
        users::get_user(&state.db, who.user_id)
            .await
            .map_err(Into::into),
    )
}
