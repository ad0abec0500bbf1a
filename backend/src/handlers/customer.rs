//! HTTP handlers for customer management

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::customer::{
    CreateCustomerInput, CustomerRow, CustomerService, UpdateCustomerInput,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct CustomerListQuery {
    pub search: Option<String>,
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<CustomerRow>> {
    current_user.0.require(Capability::ManageCustomers)?;

    let service = CustomerService::new(state.db);
    let customer = service
        .create_customer(current_user.0.branch_id, input)
        .await?;
    Ok(Json(customer))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<CustomerRow>> {
    current_user.0.require(Capability::ManageCustomers)?;

    let service = CustomerService::new(state.db);
    let customer = service
        .update_customer(current_user.0.branch_id, customer_id, input)
        .await?;
    Ok(Json(customer))
}

/// Get a customer
pub async fn get_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerRow>> {
    current_user.0.require(Capability::ManageCustomers)?;

    let service = CustomerService::new(state.db);
    let customer = service
        .get_customer(current_user.0.branch_id, customer_id)
        .await?;
    Ok(Json(customer))
}

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<CustomerListQuery>,
) -> AppResult<Json<Vec<CustomerRow>>> {
    current_user.0.require(Capability::ManageCustomers)?;

    let service = CustomerService::new(state.db);
    let customers = service
        .list_customers(current_user.0.branch_id, query.search.as_deref())
        .await?;
    Ok(Json(customers))
}
