//! HTTP handlers for service (repair) tickets

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Capability, ServiceStatus};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::service_ticket::{
    AddTicketItemInput, CreateTicketInput, RecordServicePaymentInput, ServicePaymentRow,
    ServiceTicketItemRow, ServiceTicketRow, ServiceTicketService, TicketDetail, UpdateStatusInput,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct TicketListQuery {
    pub status: Option<String>,
}

/// Create a ticket
pub async fn create_ticket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTicketInput>,
) -> AppResult<Json<ServiceTicketRow>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let service = ServiceTicketService::new(state.db);
    let ticket = service
        .create_ticket(current_user.0.branch_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(ticket))
}

/// Change a ticket's status
pub async fn update_ticket_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<ServiceTicketRow>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let service = ServiceTicketService::new(state.db);
    let ticket = service
        .update_status(current_user.0.branch_id, ticket_id, input)
        .await?;
    Ok(Json(ticket))
}

/// Add a spare part or labor line
pub async fn add_ticket_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<AddTicketItemInput>,
) -> AppResult<Json<ServiceTicketItemRow>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let service = ServiceTicketService::new(state.db);
    let item = service
        .add_item(
            current_user.0.branch_id,
            current_user.0.user_id,
            ticket_id,
            input,
        )
        .await?;
    Ok(Json(item))
}

/// Record a ticket payment
pub async fn record_ticket_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<RecordServicePaymentInput>,
) -> AppResult<Json<ServicePaymentRow>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let service = ServiceTicketService::new(state.db);
    let payment = service
        .record_payment(
            current_user.0.branch_id,
            current_user.0.user_id,
            ticket_id,
            input,
        )
        .await?;
    Ok(Json(payment))
}

/// List tickets, optionally filtered by status
pub async fn list_tickets(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<Vec<ServiceTicketRow>>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(s) => Some(ServiceStatus::from_str(s).ok_or_else(|| {
            AppError::validation("status", "Unknown ticket status", "Status tiket tidak dikenal")
        })?),
    };

    let service = ServiceTicketService::new(state.db);
    let tickets = service.list_tickets(current_user.0.branch_id, status).await?;
    Ok(Json(tickets))
}

/// Get one ticket with items and payments
pub async fn get_ticket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketDetail>> {
    current_user.0.require(Capability::ManageServiceTickets)?;

    let service = ServiceTicketService::new(state.db);
    let ticket = service.get_ticket(current_user.0.branch_id, ticket_id).await?;
    Ok(Json(ticket))
}
