use bytes::Bytes;
use hyper::Request;
use tracing::info;

use shared::types::{Plan, PlanCore, PlanId, UserId};

use crate::AppState;
use crate::database::{plans, recipes};
use crate::error::ApiError;
use crate::handlers::http::utils::{
    JsonResult, parse_json_body, path_param, respond, respond_success,
};
use crate::security::Identity;

use super::{Ownership, ensure_owner};

/// GET /plans
pub async fn handle_list_plans(_req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(plans::list_plans(&state.db).await.map_err(Into::into))
}

/// GET /plans/:id
pub async fn handle_get_plan(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(get_plan(&req, &state).await)
}

/// GET /users/:id/plans
pub async fn handle_list_user_plans(req: Request<Bytes>, state: AppState, _who: Identity) -> JsonResult {
    respond(list_user_plans(&req, &state).await)
}

/// POST /plans
pub async fn handle_create_plan(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(create_plan(&req, &state, who).await)
}

/// PATCH /plans/:id
pub async fn handle_update_plan(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond(update_plan(&req, &state, who).await)
}

/// DELETE /plans/:id
pub async fn handle_delete_plan(req: Request<Bytes>, state: AppState, who: Identity) -> JsonResult {
    respond_success(delete_plan(&req, &state, who).await)
}

async fn get_plan(req: &Request<Bytes>, state: &AppState) -> Result<Plan, ApiError> {
    let id: PlanId = path_param(req, "id")?;
    Ok(plans::get_plan(&state.db, id).await?)
}

async fn list_user_plans(req: &Request<Bytes>, state: &AppState) -> Result<Vec<Plan>, ApiError> {
    let owner: UserId = path_param(req, "id")?;
    Ok(plans::list_by_owner(&state.db, owner).await?)
}

async fn checked_core(req: &Request<Bytes>, state: &AppState) -> Result<PlanCore, ApiError> {
    let core: PlanCore = parse_json_body(req)?;
    core.validate()?;

    if let Some(missing) = recipes::first_missing(&state.db, core.recipe_ids()).await? {
        info!("Plan references unknown recipe {}", missing);
        return Err(ApiError::MissingDependency("recipe"));
    }
    Ok(core)
}

async fn create_plan(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<Plan, ApiError> {
    let core = checked_core(req, state).await?;
    Ok(plans::insert_plan(&state.db, who.user_id, &core).await?)
}

async fn update_plan(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<Plan, ApiError> {
    let id: PlanId = path_param(req, "id")?;
    let owner = plans::owner_of(&state.db, id).await?;
    ensure_owner(owner, who, Ownership::OwnerOnly)?;

    let core = checked_core(req, state).await?;
    Ok(plans::update_plan(&state.db, id, &core).await?)
}

async fn delete_plan(req: &Request<Bytes>, state: &AppState, who: Identity) -> Result<(), ApiError> {
    let id: PlanId = path_param(req, "id")?;
    let owner = plans::owner_of(&state.db, id).await?;
    ensure_owner(owner, who, Ownership::OwnerOrAdmin)?;

    plans::delete_plan(&state.db, id).await?;
    info!("Plan {} removed by {}", id, who.user_id);
    Ok(())
}
