use bytes::Bytes;
use hyper::Request;
use tracing::info;

use shared::types::{Recipe, RecipeCore, RecipeId, UserId};

use crate::AppState;
use crate::database::usage::UsageTarget;
use crate::database::{products, recipes};
use crate::error::ApiError;
use crate::handlers::http::utils::{
    JsonResult, parse_json_body, path_param, respond, respond_success,
};
use crate::security::Identity;

use super::{Ownership, ensure_owner, ensure_unused};

/// GET /recipes
pub async fn handle_list_recipes(_req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(recipes::list_recipes(&state.db).await.map_err(Into::into))
}

/// GET /recipes/:id
pub async fn handle_get_recipe(req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(get_recipe(&req, &state).await)
}

/// GET /users/:id/recipes
pub async fn handle_list_user_recipes(req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(list_user_recipes(&req, &state).await)
}

/// POST /recipes
pub async fn handle_create_recipe(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(create_recipe(&req, &state, who).await)
}

/// PATCH /recipes/:id
pub async fn handle_update_recipe(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(update_recipe(&req, &state, who).await)
}

/// DELETE /recipes/:id
pub async fn handle_delete_recipe(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond_success(delete_recipe(&req, &state, who).await)
}

async fn get_recipe(req: &Request<Bytes>, state: &AppState) -> Result<Recipe, ApiError> {
    let id: RecipeId = path_param(req, "id")?;
    Ok(recipes::get_recipe(&state.db, id).await?)
}

async fn list_user_recipes(req: &Request<Bytes>, state: &AppState) -> Result<Vec<Recipe>, ApiError> {
    let owner: UserId = path_param(req, "id")?;
    Ok(recipes::list_by_owner(&state.db, owner).await?)
}

/// Parse and validate a recipe body, then confirm every product exists.
/// Nothing is written until all three pass.
async fn checked_core(req: &Request<Bytes>, state: &AppState) -> Result<RecipeCore, ApiError> {
    let core: RecipeCore = parse_json_body(req)?;
    core.validate()?;

    if let Some(missing) = products::first_missing(&state.db, core.product_ids()).await? {
        info!("Recipe references unknown product {}", missing);
        return Err(ApiError::MissingDependency("product"));
    }
    Ok(core)
}

async fn create_recipe(
    req: &Request<Bytes>,
    state: &AppState,
    who: Identity,
) -> Result<Recipe, ApiError> {
    let core = checked_core(req, state).await?;
    Ok(recipes::insert_recipe(&state.db, who.user_id, &core).await?)
}

async fn update_recipe(
    req: &Request<Bytes>,
    state: &AppState,
    who: Identity,
) -> Result<Recipe, ApiError> {
    let id: RecipeId = path_param(req, "id")?;
    let owner = recipes::owner_of(&state.db, id).await?;
    ensure_owner(owner, who, Ownership::OwnerOnly)?;

    let core = checked_core(req, state).await?;
    Ok(recipes::update_recipe(&state.db, id, &core).await?)
}

async fn delete_recipe(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<(), ApiError> {
    let id: RecipeId = path_param(req, "id")?;
    let owner = recipes::owner_of(&state.db, id).await?;
    ensure_owner(owner, who, Ownership::OwnerOrAdmin)?;

    ensure_unused(state, UsageTarget::Recipe(id)).await?;
    recipes::delete_recipe(&state.db, id).await?;
    info!("Recipe {} removed by {}", id, who.user_id);
    Ok(())
}
