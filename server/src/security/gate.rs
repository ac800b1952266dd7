//! Per-request authentication.
//!
//! Unauthenticated -> token parsed -> user verified -> admitted.  Any step
//! may stop the request; the first failure is what the caller sees.

use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use tracing::{debug, warn};

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;
use crate::handlers::http::utils::headers::get_bearer_token;

use super::token::Identity;

/// Privilege a route demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    User,
    Admin,
}

pub async fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
    access: Access,
    now: DateTime<Utc>,
) -> Result<Identity, ApiError> {
    let token = get_bearer_token(headers).ok_or_else(|| {
        warn!("Rejected: no bearer token");
        ApiError::Unauthorized
    })?;

    let identity = state.tokens.parse(&token, now).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::from(e)
    })?;

    // The account may have been deleted since the token was issued.
    if !users::user_exists(&state.db, identity.user_id).await? {
        warn!("Rejected token for deleted user {}", identity.user_id);
        return Err(ApiError::Unauthorized);
    }

    if access == Access::Admin && !identity.admin {
        warn!("User {} denied admin route", identity.user_id);
        return Err(ApiError::Forbidden);
    }

    debug!("Admitted user {} (admin: {})", identity.user_id, identity.admin);
    Ok(identity)
}
