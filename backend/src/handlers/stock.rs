//! HTTP handlers for the stock ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    BalanceView, LowStockView, MovementWithItems, RecordMovementInput, StockMovementRow,
    StockService,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct MovementListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct QuantityQuery {
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
}

#[derive(serde::Serialize)]
pub struct QuantityResponse {
    pub quantity: rust_decimal::Decimal,
}

/// Record a stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Json<MovementWithItems>> {
    current_user.0.require(Capability::RecordStockMovements)?;

    let service = StockService::new(state.db);
    let movement = service
        .record_movement(current_user.0.branch_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(movement))
}

/// Get one movement with its items
pub async fn get_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementWithItems>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = StockService::new(state.db);
    let movement = service
        .get_movement(current_user.0.branch_id, movement_id)
        .await?;
    Ok(Json(movement))
}

/// List recent movements
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementListQuery>,
) -> AppResult<Json<Vec<StockMovementRow>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = StockService::new(state.db);
    let movements = service
        .list_movements(current_user.0.branch_id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(movements))
}

/// List stock balances
pub async fn list_balances(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<BalanceView>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = StockService::new(state.db);
    let balances = service.list_balances(current_user.0.branch_id).await?;
    Ok(Json(balances))
}

/// On-hand quantity for one (location, product, variant) key
pub async fn get_quantity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<QuantityQuery>,
) -> AppResult<Json<QuantityResponse>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = StockService::new(state.db);
    let quantity = service
        .get_quantity(
            current_user.0.branch_id,
            query.location_id,
            query.product_id,
            query.variant_id,
        )
        .await?;
    Ok(Json(QuantityResponse { quantity }))
}

/// List products at or below their minimum stock
pub async fn list_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LowStockView>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = StockService::new(state.db);
    let rows = service.list_low_stock(current_user.0.branch_id).await?;
    Ok(Json(rows))
}
