//! HTTP handlers for accounting

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::accounting::{
    AccountingService, CoaAccountRow, CreateAccountInput, CreateJournalInput, JournalEntryRow,
    JournalEntryWithLines,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct EntryListQuery {
    pub limit: Option<i64>,
}

/// Create a chart-of-accounts account
pub async fn create_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAccountInput>,
) -> AppResult<Json<CoaAccountRow>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let account = service
        .create_account(current_user.0.branch_id, input)
        .await?;
    Ok(Json(account))
}

/// List accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CoaAccountRow>>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let accounts = service.list_accounts(current_user.0.branch_id).await?;
    Ok(Json(accounts))
}

/// Create a journal entry
pub async fn create_journal_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateJournalInput>,
) -> AppResult<Json<JournalEntryWithLines>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let entry = service
        .create_entry(current_user.0.branch_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(entry))
}

/// Post a journal entry
pub async fn post_journal_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<JournalEntryRow>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let entry = service.post_entry(current_user.0.branch_id, entry_id).await?;
    Ok(Json(entry))
}

/// List journal entries
pub async fn list_journal_entries(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<EntryListQuery>,
) -> AppResult<Json<Vec<JournalEntryRow>>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let entries = service
        .list_entries(current_user.0.branch_id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(entries))
}

/// Get one journal entry with its lines
pub async fn get_journal_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<JournalEntryWithLines>> {
    current_user.0.require(Capability::ManageAccounting)?;

    let service = AccountingService::new(state.db);
    let entry = service.get_entry(current_user.0.branch_id, entry_id).await?;
    Ok(Json(entry))
}
