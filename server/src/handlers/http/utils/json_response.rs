use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, error};

use crate::error::ApiError;

/// What every HTTP handler returns.
pub type JsonResult = Result<Response<BoxBody<Bytes, Infallible>>>;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    Full::new(chunk.into()).boxed()
}

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(json))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))?;

    Ok(response)
}

/// Delivers `{"status":"success"}` with optional data.
pub fn deliver_success_json<T: Serialize>(
    data: Option<T>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let response_body = match data {
        Some(d) => json!({
            "status": "success",
            "data": d
        }),
        None => json!({
            "status": "success"
        }),
    };

    deliver_serialized_json(&response_body, StatusCode::OK)
}

/// Turn a handler outcome into a response: the value itself with 200, or
/// the error's JSON body and status.
pub fn respond<T: Serialize>(
    outcome: std::result::Result<T, ApiError>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match outcome {
        Ok(value) => deliver_serialized_json(&value, StatusCode::OK),
        Err(e) => deliver_api_error(e),
    }
}

/// Like [`respond`] for operations with nothing to return.
pub fn respond_success(
    outcome: std::result::Result<(), ApiError>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match outcome {
        Ok(()) => deliver_success_json::<()>(None),
        Err(e) => deliver_api_error(e),
    }
}

pub fn deliver_api_error(e: ApiError) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    if e.status().is_server_error() {
        error!("Delivering error JSON: {} - {} ({})", e.status().as_u16(), e.code(), e);
    } else {
        debug!("Delivering error JSON: {} - {} ({})", e.status().as_u16(), e.code(), e);
    }
    e.into_response()
}
