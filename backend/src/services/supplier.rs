//! Supplier management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::validation::validate_entity_code;

use crate::error::{AppError, AppResult};

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// A persisted supplier
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a supplier
    pub async fn create_supplier(
        &self,
        branch_id: Uuid,
        input: CreateSupplierInput,
    ) -> AppResult<SupplierRow> {
        validate_entity_code(&input.code).map_err(|msg| {
            AppError::validation("code", msg, "Kode supplier harus 2-10 huruf kapital/angka")
        })?;
        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Name is required",
                "Nama wajib diisi",
            ));
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE branch_id = $1 AND code = $2)",
        )
        .bind(branch_id)
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("supplier code".to_string()));
        }

        let supplier = sqlx::query_as::<_, SupplierRow>(
            r#"
            INSERT INTO suppliers (branch_id, code, name, phone, email, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, branch_id, code, name, phone, email, address, is_active, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    /// List active suppliers
    pub async fn list_suppliers(&self, branch_id: Uuid) -> AppResult<Vec<SupplierRow>> {
        let suppliers = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, branch_id, code, name, phone, email, address, is_active, created_at
            FROM suppliers
            WHERE branch_id = $1 AND is_active = true
            ORDER BY name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }
}
