//! Customer management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::validation::{validate_email, validate_phone};

use crate::error::{AppError, AppResult};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// A persisted customer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

fn validate_contact(phone: Option<&str>, email: Option<&str>) -> AppResult<()> {
    if let Some(phone) = phone {
        validate_phone(phone)
            .map_err(|msg| AppError::validation("phone", msg, "Nomor telepon tidak valid"))?;
    }
    if let Some(email) = email {
        validate_email(email)
            .map_err(|msg| AppError::validation("email", msg, "Format email tidak valid"))?;
    }
    Ok(())
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer
    pub async fn create_customer(
        &self,
        branch_id: Uuid,
        input: CreateCustomerInput,
    ) -> AppResult<CustomerRow> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Name is required",
                "Nama wajib diisi",
            ));
        }
        validate_contact(input.phone.as_deref(), input.email.as_deref())?;

        if let Some(phone) = &input.phone {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE branch_id = $1 AND phone = $2)",
            )
            .bind(branch_id)
            .bind(phone)
            .fetch_one(&self.db)
            .await?;
            if exists {
                return Err(AppError::DuplicateEntry("phone number".to_string()));
            }
        }

        let customer = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (branch_id, name, phone, email, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, branch_id, name, phone, email, address, notes, points,
                      created_at, updated_at
            "#,
        )
        .bind(branch_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Update a customer
    pub async fn update_customer(
        &self,
        branch_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<CustomerRow> {
        validate_contact(input.phone.as_deref(), input.email.as_deref())?;

        let customer = sqlx::query_as::<_, CustomerRow>(
            r#"
            UPDATE customers
            SET name = COALESCE($1, name),
                phone = COALESCE($2, phone),
                email = COALESCE($3, email),
                address = COALESCE($4, address),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $6 AND branch_id = $7
            RETURNING id, branch_id, name, phone, email, address, notes, points,
                      created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(customer_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(customer)
    }

    /// Get a customer by id
    pub async fn get_customer(&self, branch_id: Uuid, customer_id: Uuid) -> AppResult<CustomerRow> {
        sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, branch_id, name, phone, email, address, notes, points,
                   created_at, updated_at
            FROM customers
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(customer_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// List customers, optionally filtered by a name/phone search
    pub async fn list_customers(
        &self,
        branch_id: Uuid,
        search: Option<&str>,
    ) -> AppResult<Vec<CustomerRow>> {
        let pattern = search.map(|s| format!("%{}%", s));

        let customers = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, branch_id, name, phone, email, address, notes, points,
                   created_at, updated_at
            FROM customers
            WHERE branch_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR phone ILIKE $2)
            ORDER BY name
            "#,
        )
        .bind(branch_id)
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }
}
