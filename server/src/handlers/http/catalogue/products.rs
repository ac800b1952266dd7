use bytes::Bytes;
use hyper::Request;
use tracing::info;

use shared::types::{Product, ProductCore, ProductId};

use crate::AppState;
use crate::database::products;
use crate::database::usage::UsageTarget;
use crate::error::ApiError;
use crate::handlers::http::utils::{
    JsonResult, parse_json_body, path_param, respond, respond_success,
};
use crate::security::Identity;

use super::ensure_unused;

/// GET /products
pub async fn handle_list_products(_req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(products::list_products(&state.db).await.map_err(Into::into))
}

/// GET /products/:id
pub async fn handle_get_product(req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(get_product(&req, &state).await)
}

/// POST /products
pub async fn handle_create_product(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(create_product(&req, &state).await)
}

/// PATCH /products/:id
pub async fn handle_update_product(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(update_product(&req, &state).await)
}

/// DELETE /products/:id
pub async fn handle_delete_product(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond_success(delete_product(&req, &state).await)
}

async fn get_product(req: &Request<Bytes>, state: &AppState) -> Result<Product, ApiError> {
    let id: ProductId = path_param(req, "id")?;
    Ok(products::get_product(&state.db, id).await?)
}

async fn create_product(req: &Request<Bytes>, state: &AppState) -> Result<Product, ApiError> {
    let core: ProductCore = parse_json_body(req)?;
    core.validate()?;
    Ok(products::insert_product(&state.db, &core).await?)
}

async fn update_product(req: &Request<Bytes>, state: &AppState) -> Result<Product, ApiError> {
    let id: ProductId = path_param(req, "id")?;
    let core: ProductCore = parse_json_body(req)?;
    core.validate()?;
    Ok(products::update_product(&state.db, id, &core).await?)
}

async fn delete_product(req: &Request<Bytes>, state: &AppState) -> Result<(), ApiError> {
    let id: ProductId = path_param(req, "id")?;

    ensure_unused(state, UsageTarget::Product(id)).await?;
    products::delete_product(&state.db, id).await?;
    info!("Product {} removed", id);
    Ok(())
}
