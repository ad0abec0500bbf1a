//! HTTP handlers for branch and location management

use axum::{extract::State, Json};

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::branch::{
    BranchRow, BranchService, CreateLocationInput, LocationRow, UpdateBranchInput,
};
use crate::AppState;

/// Get the current branch
pub async fn get_branch(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<BranchRow>> {
    let service = BranchService::new(state.db);
    let branch = service.get_branch(current_user.0.branch_id).await?;
    Ok(Json(branch))
}

/// Update the current branch
pub async fn update_branch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateBranchInput>,
) -> AppResult<Json<BranchRow>> {
    current_user.0.require(Capability::ManageBranches)?;

    let service = BranchService::new(state.db);
    let branch = service
        .update_branch(current_user.0.branch_id, input)
        .await?;
    Ok(Json(branch))
}

/// Create an inventory location
pub async fn create_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<Json<LocationRow>> {
    current_user.0.require(Capability::ManageBranches)?;

    let service = BranchService::new(state.db);
    let location = service
        .create_location(current_user.0.branch_id, input)
        .await?;
    Ok(Json(location))
}

/// List active inventory locations
pub async fn list_locations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LocationRow>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = BranchService::new(state.db);
    let locations = service.list_locations(current_user.0.branch_id).await?;
    Ok(Json(locations))
}
