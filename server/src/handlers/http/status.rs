use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde_json::json;

use crate::AppState;
use crate::handlers::http::utils::{JsonResult, deliver_serialized_json};

/// GET /version
pub async fn handle_version(_req: Request<Bytes>, _state: AppState) -> JsonResult {
    deliver_serialized_json(&json!({ "version": env!("CARGO_PKG_VERSION") }), StatusCode::OK)
}

/// GET /health
///
/// Reports 503 when the database cannot answer a trivial query.
pub async fn handle_health(_req: Request<Bytes>, state: AppState) -> JsonResult {
    let healthy = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    if healthy {
        deliver_serialized_json(&json!({ "status": "success", "health": "ok" }), StatusCode::OK)
    } else {
        deliver_serialized_json(
            &json!({ "status": "error", "health": "storage unavailable" }),
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }
}
