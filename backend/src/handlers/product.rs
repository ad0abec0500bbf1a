//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    CreateProductInput, CreateVariantInput, ProductRow, ProductService, ProductVariantRow,
    UpdateProductInput,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<ProductRow>> {
    current_user.0.require(Capability::ManageProducts)?;

    let service = ProductService::new(state.db);
    let product = service
        .create_product(current_user.0.branch_id, input)
        .await?;
    Ok(Json(product))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductRow>> {
    current_user.0.require(Capability::ManageProducts)?;

    let service = ProductService::new(state.db);
    let product = service
        .update_product(current_user.0.branch_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductRow>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = ProductService::new(state.db);
    let product = service
        .get_product(current_user.0.branch_id, product_id)
        .await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Vec<ProductRow>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = ProductService::new(state.db);
    let products = service
        .list_products(current_user.0.branch_id, query.search.as_deref())
        .await?;
    Ok(Json(products))
}

/// Add a variant to a product
pub async fn create_variant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<CreateVariantInput>,
) -> AppResult<Json<ProductVariantRow>> {
    current_user.0.require(Capability::ManageProducts)?;

    let service = ProductService::new(state.db);
    let variant = service
        .create_variant(current_user.0.branch_id, product_id, input)
        .await?;
    Ok(Json(variant))
}

/// List a product's variants
pub async fn list_variants(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductVariantRow>>> {
    current_user.0.require(Capability::ViewInventory)?;

    let service = ProductService::new(state.db);
    let variants = service
        .list_variants(current_user.0.branch_id, product_id)
        .await?;
    Ok(Json(variants))
}
