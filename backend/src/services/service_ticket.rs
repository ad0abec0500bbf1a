//! Service (repair) ticket service
//!
//! Ticket statuses move only along the closed transition graph defined in
//! the shared models; SELESAI and DIAMBIL stamp their timestamps as they
//! are entered. Spare parts added to a ticket leave stock through the
//! ledger inside the same transaction as the ticket item.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{
    JournalType, PaymentMethod, ServiceItemType, ServicePaymentType, ServiceStatus,
    StockMovementType,
};

use crate::error::{AppError, AppResult};
use crate::services::accounting::{AccountingService, JournalLineInput};
use crate::services::document::{next_document_number, DocType};
use crate::services::stock::{MovementItemInput, RecordMovementInput, StockService};

/// Service ticket service
#[derive(Clone)]
pub struct ServiceTicketService {
    db: PgPool,
}

/// A persisted service ticket
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceTicketRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub ticket_number: String,
    pub customer_id: Option<Uuid>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub device_imei: Option<String>,
    pub device_color: Option<String>,
    pub complaint: String,
    pub diagnosis: Option<String>,
    pub estimated_cost: Decimal,
    pub final_cost: Decimal,
    pub dp_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub technician_id: Option<Uuid>,
    pub received_by: Option<Uuid>,
    pub received_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted ticket item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceTicketItemRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub item_type: String,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A persisted ticket payment
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServicePaymentRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub payment_type: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A ticket with its items and payments
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: ServiceTicketRow,
    pub items: Vec<ServiceTicketItemRow>,
    pub payments: Vec<ServicePaymentRow>,
}

/// Input for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketInput {
    pub customer_id: Option<Uuid>,
    pub device_brand: String,
    pub device_model: Option<String>,
    pub device_imei: Option<String>,
    pub device_color: Option<String>,
    pub complaint: String,
    pub estimated_cost: Option<Decimal>,
    /// Down payment taken at intake
    pub dp_amount: Option<Decimal>,
    pub dp_payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Input for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: ServiceStatus,
    pub diagnosis: Option<String>,
    pub technician_id: Option<Uuid>,
}

/// Input for adding a ticket item
#[derive(Debug, Deserialize)]
pub struct AddTicketItemInput {
    pub item_type: ServiceItemType,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    /// Stock location the spare part is taken from
    pub location_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Input for recording a ticket payment
#[derive(Debug, Deserialize)]
pub struct RecordServicePaymentInput {
    pub payment_type: ServicePaymentType,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
}

impl ServiceTicketService {
    /// Create a new ServiceTicketService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a device at the counter
    pub async fn create_ticket(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        input: CreateTicketInput,
    ) -> AppResult<ServiceTicketRow> {
        if input.complaint.trim().is_empty() {
            return Err(AppError::validation(
                "complaint",
                "Complaint is required",
                "Keluhan wajib diisi",
            ));
        }
        if input.device_brand.trim().is_empty() {
            return Err(AppError::validation(
                "device_brand",
                "Device brand is required",
                "Merek perangkat wajib diisi",
            ));
        }
        let estimated = input.estimated_cost.unwrap_or(Decimal::ZERO);
        let dp = input.dp_amount.unwrap_or(Decimal::ZERO);
        if estimated < Decimal::ZERO || dp < Decimal::ZERO {
            return Err(AppError::validation(
                "estimated_cost/dp_amount",
                "Amounts cannot be negative",
                "Nilai tidak boleh negatif",
            ));
        }

        if let Some(customer_id) = input.customer_id {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND branch_id = $2)",
            )
            .bind(customer_id)
            .bind(branch_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        let mut tx = self.db.begin().await?;

        let ticket_number =
            next_document_number(&mut *tx, branch_id, DocType::ServiceTicket).await?;

        let ticket = sqlx::query_as::<_, ServiceTicketRow>(
            r#"
            INSERT INTO service_tickets (
                branch_id, ticket_number, customer_id, device_brand, device_model,
                device_imei, device_color, complaint, estimated_cost, dp_amount,
                paid_amount, status, received_by, received_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, 'DITERIMA', $11, NOW(), $12)
            RETURNING id, branch_id, ticket_number, customer_id, device_brand, device_model,
                      device_imei, device_color, complaint, diagnosis, estimated_cost,
                      final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                      received_at, completed_at, picked_up_at, notes, created_at, updated_at
            "#,
        )
        .bind(branch_id)
        .bind(&ticket_number)
        .bind(input.customer_id)
        .bind(&input.device_brand)
        .bind(&input.device_model)
        .bind(&input.device_imei)
        .bind(&input.device_color)
        .bind(&input.complaint)
        .bind(estimated)
        .bind(dp)
        .bind(user_id)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        if dp > Decimal::ZERO {
            let method = input.dp_payment_method.unwrap_or(PaymentMethod::Cash);
            sqlx::query(
                r#"
                INSERT INTO service_payments (ticket_id, payment_type, payment_method, amount, created_by)
                VALUES ($1, 'dp', $2, $3, $4)
                "#,
            )
            .bind(ticket.id)
            .bind(method.as_str())
            .bind(dp)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            Self::post_payment_journal(&mut tx, branch_id, user_id, &ticket, dp).await?;
        }

        tx.commit().await?;

        tracing::info!(ticket_number = %ticket.ticket_number, "service ticket created");

        Ok(ticket)
    }

    /// Move a ticket along the status graph
    pub async fn update_status(
        &self,
        branch_id: Uuid,
        ticket_id: Uuid,
        input: UpdateStatusInput,
    ) -> AppResult<ServiceTicketRow> {
        let mut tx = self.db.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM service_tickets WHERE id = $1 AND branch_id = $2 FOR UPDATE",
        )
        .bind(ticket_id)
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| AppError::NotFound("Service ticket".to_string()))?;
        let current = ServiceStatus::from_str(&current)
            .ok_or_else(|| AppError::Internal(format!("Unknown ticket status {}", current)))?;

        if !current.can_transition_to(input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                current.as_str(),
                input.status.as_str()
            )));
        }

        let ticket = sqlx::query_as::<_, ServiceTicketRow>(
            r#"
            UPDATE service_tickets
            SET status = $1,
                diagnosis = COALESCE($2, diagnosis),
                technician_id = COALESCE($3, technician_id),
                completed_at = CASE WHEN $1 = 'SELESAI' THEN NOW() ELSE completed_at END,
                picked_up_at = CASE WHEN $1 = 'DIAMBIL' THEN NOW() ELSE picked_up_at END,
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, branch_id, ticket_number, customer_id, device_brand, device_model,
                      device_imei, device_color, complaint, diagnosis, estimated_cost,
                      final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                      received_at, completed_at, picked_up_at, notes, created_at, updated_at
            "#,
        )
        .bind(input.status.as_str())
        .bind(&input.diagnosis)
        .bind(input.technician_id)
        .bind(ticket_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ticket)
    }

    /// Add a spare part or labor line to an active ticket
    pub async fn add_item(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        ticket_id: Uuid,
        input: AddTicketItemInput,
    ) -> AppResult<ServiceTicketItemRow> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::validation(
                "quantity",
                "Quantity must be positive",
                "Jumlah harus positif",
            ));
        }
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::validation(
                "unit_price",
                "Unit price cannot be negative",
                "Harga satuan tidak boleh negatif",
            ));
        }
        if input.description.trim().is_empty() {
            return Err(AppError::validation(
                "description",
                "Description is required",
                "Deskripsi wajib diisi",
            ));
        }

        let mut tx = self.db.begin().await?;

        let ticket = Self::lock_ticket(&mut tx, branch_id, ticket_id).await?;
        let status = ServiceStatus::from_str(&ticket.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown ticket status {}", ticket.status)))?;
        if !status.is_active() {
            return Err(AppError::Conflict {
                resource: "service_ticket".to_string(),
                message: "Items can only be added to an active ticket".to_string(),
                message_id: "Item hanya bisa ditambah pada tiket aktif".to_string(),
            });
        }

        let mut cost_price = Decimal::ZERO;

        if input.item_type == ServiceItemType::Sparepart {
            let product_id = input.product_id.ok_or_else(|| {
                AppError::validation(
                    "product_id",
                    "A spare part needs a product",
                    "Sparepart harus memilih produk",
                )
            })?;
            let location_id = input.location_id.ok_or_else(|| {
                AppError::validation(
                    "location_id",
                    "A spare part needs a stock location",
                    "Sparepart harus memilih lokasi stok",
                )
            })?;

            let product: Option<(Decimal, Decimal)> = sqlx::query_as(
                "SELECT avg_cost, buy_price FROM products WHERE id = $1 AND branch_id = $2",
            )
            .bind(product_id)
            .bind(branch_id)
            .fetch_optional(&mut *tx)
            .await?;
            let (avg_cost, buy_price) =
                product.ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            cost_price = if avg_cost > Decimal::ZERO {
                avg_cost
            } else {
                buy_price
            };

            // Part leaves stock with the ticket item, atomically
            let movement_input = RecordMovementInput {
                movement_type: StockMovementType::Out,
                from_location_id: Some(location_id),
                to_location_id: None,
                items: vec![MovementItemInput {
                    product_id,
                    variant_id: input.variant_id,
                    quantity: input.quantity,
                    unit_cost: Some(cost_price),
                    notes: None,
                }],
                reference_type: Some("service_ticket".to_string()),
                reference_id: Some(ticket_id),
                notes: Some(format!("Sparepart {}", ticket.ticket_number)),
                idempotency_key: None,
                allow_negative: false,
            };
            StockService::record_movement_in_tx(&mut tx, branch_id, Some(user_id), &movement_input)
                .await?;
        }

        let subtotal = input.quantity * input.unit_price;

        let item = sqlx::query_as::<_, ServiceTicketItemRow>(
            r#"
            INSERT INTO service_ticket_items (
                ticket_id, item_type, product_id, variant_id, description,
                quantity, unit_price, cost_price, subtotal
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, ticket_id, item_type, product_id, variant_id, description,
                      quantity, unit_price, cost_price, subtotal, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(input.item_type.as_str())
        .bind(input.product_id)
        .bind(input.variant_id)
        .bind(&input.description)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(cost_price)
        .bind(subtotal)
        .fetch_one(&mut *tx)
        .await?;

        // Final cost tracks the sum of the ticket's items
        sqlx::query(
            r#"
            UPDATE service_tickets
            SET final_cost = (SELECT COALESCE(SUM(subtotal), 0) FROM service_ticket_items WHERE ticket_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item)
    }

    /// Record a payment against a ticket
    pub async fn record_payment(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        ticket_id: Uuid,
        input: RecordServicePaymentInput,
    ) -> AppResult<ServicePaymentRow> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "amount",
                "Amount must be positive",
                "Nominal harus positif",
            ));
        }

        let mut tx = self.db.begin().await?;

        let ticket = Self::lock_ticket(&mut tx, branch_id, ticket_id).await?;

        // Settlement may not overshoot a known final cost
        if input.payment_type == ServicePaymentType::Pelunasan
            && ticket.final_cost > Decimal::ZERO
            && ticket.paid_amount + input.amount > ticket.final_cost
        {
            return Err(AppError::validation(
                "amount",
                "Payment exceeds the remaining balance",
                "Pembayaran melebihi sisa tagihan",
            ));
        }

        let payment = sqlx::query_as::<_, ServicePaymentRow>(
            r#"
            INSERT INTO service_payments (ticket_id, payment_type, payment_method, amount, reference, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ticket_id, payment_type, payment_method, amount, reference, created_by, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(input.payment_type.as_str())
        .bind(input.payment_method.as_str())
        .bind(input.amount)
        .bind(&input.reference)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE service_tickets
            SET paid_amount = paid_amount + $1,
                dp_amount = dp_amount + CASE WHEN $2 = 'dp' THEN $1 ELSE 0 END,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(input.amount)
        .bind(input.payment_type.as_str())
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

        Self::post_payment_journal(&mut tx, branch_id, user_id, &ticket, input.amount).await?;

        tx.commit().await?;

        Ok(payment)
    }

    /// Service revenue is recognized as payments come in
    async fn post_payment_journal(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        user_id: Uuid,
        ticket: &ServiceTicketRow,
        amount: Decimal,
    ) -> AppResult<()> {
        let kas = AccountingService::account_id_by_code(tx, branch_id, "1000").await?;
        let pendapatan_servis = AccountingService::account_id_by_code(tx, branch_id, "4100").await?;

        let lines = vec![
            JournalLineInput {
                account_id: kas,
                debit: amount,
                credit: Decimal::ZERO,
                description: None,
            },
            JournalLineInput {
                account_id: pendapatan_servis,
                debit: Decimal::ZERO,
                credit: amount,
                description: None,
            },
        ];

        AccountingService::create_entry_in_tx(
            tx,
            branch_id,
            Some(user_id),
            JournalType::Service,
            Utc::now().date_naive(),
            Some("service_ticket"),
            Some(ticket.id),
            Some(&format!("Servis {}", ticket.ticket_number)),
            &lines,
            true,
        )
        .await?;

        Ok(())
    }

    async fn lock_ticket(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        ticket_id: Uuid,
    ) -> AppResult<ServiceTicketRow> {
        sqlx::query_as::<_, ServiceTicketRow>(
            r#"
            SELECT id, branch_id, ticket_number, customer_id, device_brand, device_model,
                   device_imei, device_color, complaint, diagnosis, estimated_cost,
                   final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                   received_at, completed_at, picked_up_at, notes, created_at, updated_at
            FROM service_tickets
            WHERE id = $1 AND branch_id = $2
            FOR UPDATE
            "#,
        )
        .bind(ticket_id)
        .bind(branch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Service ticket".to_string()))
    }

    /// List tickets, optionally filtered by status
    pub async fn list_tickets(
        &self,
        branch_id: Uuid,
        status: Option<ServiceStatus>,
    ) -> AppResult<Vec<ServiceTicketRow>> {
        let tickets = match status {
            Some(status) => {
                sqlx::query_as::<_, ServiceTicketRow>(
                    r#"
                    SELECT id, branch_id, ticket_number, customer_id, device_brand, device_model,
                           device_imei, device_color, complaint, diagnosis, estimated_cost,
                           final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                           received_at, completed_at, picked_up_at, notes, created_at, updated_at
                    FROM service_tickets
                    WHERE branch_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(branch_id)
                .bind(status.as_str())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, ServiceTicketRow>(
                    r#"
                    SELECT id, branch_id, ticket_number, customer_id, device_brand, device_model,
                           device_imei, device_color, complaint, diagnosis, estimated_cost,
                           final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                           received_at, completed_at, picked_up_at, notes, created_at, updated_at
                    FROM service_tickets
                    WHERE branch_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(branch_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(tickets)
    }

    /// Get one ticket with its items and payments
    pub async fn get_ticket(&self, branch_id: Uuid, ticket_id: Uuid) -> AppResult<TicketDetail> {
        let ticket = sqlx::query_as::<_, ServiceTicketRow>(
            r#"
            SELECT id, branch_id, ticket_number, customer_id, device_brand, device_model,
                   device_imei, device_color, complaint, diagnosis, estimated_cost,
                   final_cost, dp_amount, paid_amount, status, technician_id, received_by,
                   received_at, completed_at, picked_up_at, notes, created_at, updated_at
            FROM service_tickets
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(ticket_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service ticket".to_string()))?;

        let items = sqlx::query_as::<_, ServiceTicketItemRow>(
            r#"
            SELECT id, ticket_id, item_type, product_id, variant_id, description,
                   quantity, unit_price, cost_price, subtotal, created_at
            FROM service_ticket_items
            WHERE ticket_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, ServicePaymentRow>(
            r#"
            SELECT id, ticket_id, payment_type, payment_method, amount, reference, created_by, created_at
            FROM service_payments
            WHERE ticket_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.db)
        .await?;

        Ok(TicketDetail {
            ticket,
            items,
            payments,
        })
    }

}
