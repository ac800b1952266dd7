use bytes::Bytes;
use hyper::Request;

use shared::types::{Rating, RatingCore, RecipeId};

use crate::AppState;
use crate::database::{ratings, recipes};
use crate::error::ApiError;
use crate::handlers::http::utils::{
    JsonResult, parse_json_body, path_param, respond, respond_success,
};
use crate::security::Identity;

/// GET /recipes/:id/ratings
pub async fn handle_list_ratings(req: Request<Bytes>, state: AppState) -> JsonResult {
    respond(list_ratings(&req, &state).await)
}

/// POST /recipes/:id/ratings
pub async fn handle_rate_recipe(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(rate_recipe(&req, &state, who).await)
}

/// PATCH /recipes/:id/ratings
pub async fn handle_update_rating(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(update_rating(&req, &state, who).await)
}

/// DELETE /recipes/:id/ratings
pub async fn handle_delete_rating(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond_success(delete_rating(&req, &state, who).await)
}

async fn list_ratings(req: &Request<Bytes>, state: &AppState) -> Result<Vec<Rating>, ApiError> {
    let recipe: RecipeId = path_param(req, "id")?;
    // An unknown recipe is a 404, not an empty list.
    recipes::owner_of(&state.db, recipe).await?;
    Ok(ratings::list_for_recipe(&state.db, recipe).await?)
}

async fn rate_recipe(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<Rating, ApiError> {
    let recipe: RecipeId = path_param(req, "id")?;
    let core: RatingCore = parse_json_body(req)?;
    core.validate()?;
    Ok(ratings::insert_rating(&state.db, recipe, who.user_id, &core).await?)
}

/// Scoped to the caller's own rating of the recipe.
async fn update_rating(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<Rating, ApiError> {
    let recipe: RecipeId = path_param(req, "id")?;
    let core: RatingCore = parse_json_body(req)?;
    core.validate()?;
    Ok(ratings::update_rating(&state.db, recipe, who.user_id, &core).await?)
}

async fn delete_rating(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<(), ApiError> {
    let recipe: RecipeId = path_param(req, "id")?;
    Ok(ratings::delete_rating(&state.db, recipe, who.user_id).await?)
}
