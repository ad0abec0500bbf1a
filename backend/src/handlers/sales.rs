//! HTTP handlers for POS sales and cash sessions

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales::{
    CashSessionRow, CheckoutInput, CloseSessionInput, InvoiceWithItems, OpenSessionInput,
    SalesInvoiceRow, SalesService,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct InvoiceListQuery {
    pub limit: Option<i64>,
}

fn sales_service(state: &AppState) -> SalesService {
    SalesService::new(state.db.clone(), state.config.pos.points_per_rupiah)
}

/// Complete a POS sale
pub async fn checkout(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CheckoutInput>,
) -> AppResult<Json<InvoiceWithItems>> {
    current_user.0.require(Capability::Checkout)?;

    let invoice = sales_service(&state)
        .checkout(current_user.0.branch_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(invoice))
}

/// Void a completed invoice
pub async fn void_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<SalesInvoiceRow>> {
    current_user.0.require(Capability::VoidSales)?;

    let invoice = sales_service(&state)
        .void_invoice(current_user.0.branch_id, current_user.0.user_id, invoice_id)
        .await?;
    Ok(Json(invoice))
}

/// List recent invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<Vec<SalesInvoiceRow>>> {
    current_user.0.require(Capability::Checkout)?;

    let invoices = sales_service(&state)
        .list_invoices(current_user.0.branch_id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(invoices))
}

/// Get one invoice with its items
pub async fn get_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceWithItems>> {
    current_user.0.require(Capability::Checkout)?;

    let invoice = sales_service(&state)
        .get_invoice(current_user.0.branch_id, invoice_id)
        .await?;
    Ok(Json(invoice))
}

/// Open a cash session
pub async fn open_cash_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OpenSessionInput>,
) -> AppResult<Json<CashSessionRow>> {
    current_user.0.require(Capability::ManageCashSessions)?;

    let session = sales_service(&state)
        .open_session(current_user.0.branch_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(session))
}

/// Close a cash session
pub async fn close_cash_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<CloseSessionInput>,
) -> AppResult<Json<CashSessionRow>> {
    current_user.0.require(Capability::ManageCashSessions)?;

    let session = sales_service(&state)
        .close_session(
            current_user.0.branch_id,
            current_user.0.user_id,
            session_id,
            input,
        )
        .await?;
    Ok(Json(session))
}
