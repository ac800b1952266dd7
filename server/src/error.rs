use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use thiserror::Error;
use tracing::error;

use shared::types::{ErrorResponse, ValidationError};

use crate::database::DbError;
use crate::handlers::http::utils::json_response::deliver_serialized_json;
use crate::security::TokenError;

/// Every failure a handler can report to a client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient privileges")]
    Forbidden,

    #[error("internal server error")]
    Internal,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("referenced {0} does not exist")]
    MissingDependency(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable")]
    StorageUnavailable,

    #[error(transparent)]
    InvalidAttribute(#[from] ValidationError),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("request body too large")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) | Self::MissingDependency(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidAttribute(_) | Self::MalformedBody(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MissingDependency(_) => "DEPENDENCY_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::InvalidAttribute(_) => "INVALID_ATTRIBUTE",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match self {
            Self::InvalidAttribute(e) => ErrorResponse::invalid_attribute(e),
            other => ErrorResponse::new(other.code(), &other.to_string()),
        }
    }

    pub fn into_response(self) -> anyhow::Result<Response<BoxBody<Bytes, Infallible>>> {
        deliver_serialized_json(&self.body(), self.status())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(entity) => Self::NotFound(entity),
            DbError::MissingDependency(entity) => Self::MissingDependency(entity),
            DbError::Duplicate(entity) => Self::Conflict(format!("{entity} already exists")),
            DbError::InUse(entity) => Self::Conflict(format!("{entity} in use")),
            DbError::Corrupt(detail) => {
                error!("Corrupt row read from storage: {}", detail);
                Self::Internal
            }
            DbError::Sqlx(e) => {
                error!("Storage failure: {}", e);
                Self::StorageUnavailable
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Unauthorized(_) => Self::Unauthorized,
            TokenError::Internal(detail) => {
                error!("Token processing failed: {}", detail);
                Self::Internal
            }
        }
    }
}
