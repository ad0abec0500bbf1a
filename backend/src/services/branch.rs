//! Branch and inventory location service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::validation::validate_entity_code;

use crate::error::{AppError, AppResult};

/// Branch service
#[derive(Clone)]
pub struct BranchService {
    db: PgPool,
}

/// A persisted branch
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BranchRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted inventory location
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for updating a branch
#[derive(Debug, Deserialize)]
pub struct UpdateBranchInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for creating an inventory location
#[derive(Debug, Deserialize)]
pub struct CreateLocationInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

impl BranchService {
    /// Create a new BranchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the current branch
    pub async fn get_branch(&self, branch_id: Uuid) -> AppResult<BranchRow> {
        sqlx::query_as::<_, BranchRow>(
            "SELECT id, code, name, address, phone, is_active, created_at, updated_at FROM branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))
    }

    /// Update the current branch
    pub async fn update_branch(
        &self,
        branch_id: Uuid,
        input: UpdateBranchInput,
    ) -> AppResult<BranchRow> {
        let branch = sqlx::query_as::<_, BranchRow>(
            r#"
            UPDATE branches
            SET name = COALESCE($1, name),
                address = COALESCE($2, address),
                phone = COALESCE($3, phone),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, code, name, address, phone, is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.is_active)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

        Ok(branch)
    }

    /// Create an inventory location
    pub async fn create_location(
        &self,
        branch_id: Uuid,
        input: CreateLocationInput,
    ) -> AppResult<LocationRow> {
        validate_entity_code(&input.code).map_err(|msg| {
            AppError::validation("code", msg, "Kode lokasi harus 2-10 huruf kapital/angka")
        })?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM inventory_locations WHERE branch_id = $1 AND code = $2)",
        )
        .bind(branch_id)
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("location code".to_string()));
        }

        let location = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO inventory_locations (branch_id, code, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, branch_id, code, name, description, is_active, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    /// List active inventory locations
    pub async fn list_locations(&self, branch_id: Uuid) -> AppResult<Vec<LocationRow>> {
        let locations = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, branch_id, code, name, description, is_active, created_at
            FROM inventory_locations
            WHERE branch_id = $1 AND is_active = true
            ORDER BY name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }
}
