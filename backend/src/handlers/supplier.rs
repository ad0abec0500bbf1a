//! HTTP handlers for supplier management

use axum::{extract::State, Json};

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::supplier::{CreateSupplierInput, SupplierRow, SupplierService};
use crate::AppState;

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<Json<SupplierRow>> {
    current_user.0.require(Capability::ManageProducts)?;

    let service = SupplierService::new(state.db);
    let supplier = service
        .create_supplier(current_user.0.branch_id, input)
        .await?;
    Ok(Json(supplier))
}

/// List active suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SupplierRow>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = SupplierService::new(state.db);
    let suppliers = service.list_suppliers(current_user.0.branch_id).await?;
    Ok(Json(suppliers))
}
