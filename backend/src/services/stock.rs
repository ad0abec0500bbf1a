//! Stock ledger service
//!
//! Movements are the append-only source of truth; stock balances are the
//! materialized view kept in lockstep with them. Recording a movement
//! writes the movement, its items, and the affected balances in a single
//! transaction, so a partial ledger entry is never visible. Balance rows
//! are locked (`FOR UPDATE`) before they change; decrements that would
//! drive a balance below zero are rejected unless the caller explicitly
//! allows a negative balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use shared::models::{movement_deltas, StockMovementType};
use shared::validation::{validate_movement_locations, validate_movement_quantity};

use crate::error::{AppError, AppResult};
use crate::services::document::{next_document_number, DocType};

/// Retry budget for transient conflicts on the ledger transaction
const MAX_CONFLICT_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 50;

/// Stock service for recording movements and querying balances
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A persisted stock movement
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub movement_number: String,
    pub movement_type: String,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A persisted stock movement item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementItemRow {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A movement together with its items
#[derive(Debug, Clone, Serialize)]
pub struct MovementWithItems {
    #[serde(flatten)]
    pub movement: StockMovementRow,
    pub items: Vec<StockMovementItemRow>,
}

/// One item of a movement to record
#[derive(Debug, Clone, Deserialize)]
pub struct MovementItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub movement_type: StockMovementType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub items: Vec<MovementItemInput>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Replaying a request with the same key returns the original
    /// movement instead of applying the deltas again
    pub idempotency_key: Option<String>,
    /// Permit a decrement to drive the balance below zero (supervised
    /// corrections only)
    #[serde(default)]
    pub allow_negative: bool,
}

/// Stock balance with product and location context for listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BalanceView {
    pub id: Uuid,
    pub location_id: Uuid,
    pub location_name: String,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub sku: String,
    pub quantity: Decimal,
    pub reserved_qty: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Product whose total on-hand quantity fell to its minimum
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockView {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub min_stock: Decimal,
    pub on_hand: Decimal,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement and adjust the affected balances.
    ///
    /// The whole write set runs in one transaction. Transient conflicts
    /// (serialization failures, deadlocks, unique races) retry with
    /// exponential backoff before surfacing as a conflict error.
    pub async fn record_movement(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<MovementWithItems> {
        let mut attempt = 0;
        loop {
            let mut tx = self.db.begin().await?;
            match Self::record_movement_in_tx(&mut tx, branch_id, Some(user_id), &input).await {
                Ok(movement) => {
                    tx.commit().await?;
                    return Ok(movement);
                }
                Err(err) if is_transient(&err) && attempt < MAX_CONFLICT_RETRIES => {
                    drop(tx);
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY_MS * (1u64 << (attempt - 1));
                    tracing::warn!(
                        attempt,
                        delay_ms = delay,
                        "transient conflict recording stock movement, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(err) if is_transient(&err) => {
                    drop(tx);
                    return Err(AppError::Conflict {
                        resource: "stock_balance".to_string(),
                        message: "Concurrent stock updates kept conflicting; retry the movement"
                            .to_string(),
                        message_id: "Pembaruan stok terus bentrok; ulangi pergerakan".to_string(),
                    });
                }
                Err(err) => {
                    drop(tx);
                    return Err(err);
                }
            }
        }
    }

    /// Record a movement inside an existing transaction.
    ///
    /// Used directly by checkout and ticket settlement so the movement
    /// commits or rolls back together with the document that caused it.
    pub(crate) async fn record_movement_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        user_id: Option<Uuid>,
        input: &RecordMovementInput,
    ) -> AppResult<MovementWithItems> {
        // Validation happens before any write
        validate_movement_locations(
            input.movement_type,
            input.from_location_id,
            input.to_location_id,
        )
        .map_err(|msg| AppError::validation("from_location_id/to_location_id", msg, "Lokasi pergerakan tidak lengkap"))?;

        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "A movement needs at least one item",
                "Pergerakan membutuhkan minimal satu item",
            ));
        }
        for item in &input.items {
            validate_movement_quantity(item.quantity)
                .map_err(|msg| AppError::validation("quantity", msg, "Jumlah harus positif"))?;
        }

        Self::ensure_locations(tx, branch_id, input).await?;
        Self::ensure_products(tx, branch_id, &input.items).await?;

        // Replay of an already-recorded request returns the original
        if let Some(key) = &input.idempotency_key {
            let existing: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM stock_movements WHERE branch_id = $1 AND idempotency_key = $2",
            )
            .bind(branch_id)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await?;

            if let Some(movement_id) = existing {
                return Self::fetch_movement(tx, branch_id, movement_id).await;
            }
        }

        let movement_number =
            next_document_number(&mut **tx, branch_id, DocType::StockMovement).await?;

        let movement = sqlx::query_as::<_, StockMovementRow>(
            r#"
            INSERT INTO stock_movements (
                branch_id, movement_number, movement_type, from_location_id, to_location_id,
                reference_type, reference_id, notes, idempotency_key, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, branch_id, movement_number, movement_type, from_location_id,
                      to_location_id, reference_type, reference_id, notes, created_by, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&movement_number)
        .bind(input.movement_type.as_str())
        .bind(input.from_location_id)
        .bind(input.to_location_id)
        .bind(&input.reference_type)
        .bind(input.reference_id)
        .bind(&input.notes)
        .bind(&input.idempotency_key)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, StockMovementItemRow>(
                r#"
                INSERT INTO stock_movement_items (movement_id, product_id, variant_id, quantity, unit_cost, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, movement_id, product_id, variant_id, quantity, unit_cost, notes, created_at
                "#,
            )
            .bind(movement.id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(item.quantity)
            .bind(item.unit_cost)
            .bind(&item.notes)
            .fetch_one(&mut **tx)
            .await?;

            // Inbound receipts with a cost refresh the moving-average cost
            // while the pre-receipt quantity is still known
            if input.movement_type == StockMovementType::In {
                if let Some(unit_cost) = item.unit_cost {
                    Self::update_average_cost(tx, branch_id, item, unit_cost).await?;
                }
            }

            let deltas = movement_deltas(
                input.movement_type,
                input.from_location_id,
                input.to_location_id,
                item.quantity,
            )
            .map_err(|msg| {
                AppError::validation("movement_type", msg, "Lokasi pergerakan tidak lengkap")
            })?;

            for delta in deltas {
                Self::apply_balance_delta(
                    tx,
                    branch_id,
                    delta.location_id,
                    item.product_id,
                    item.variant_id,
                    delta.delta,
                    input.allow_negative,
                )
                .await?;
            }

            items.push(row);
        }

        tracing::debug!(
            movement_number = %movement.movement_number,
            movement_type = %movement.movement_type,
            item_count = items.len(),
            "stock movement recorded"
        );

        Ok(MovementWithItems { movement, items })
    }

    /// Apply one signed delta to a balance row, creating it if absent.
    ///
    /// The existing row is locked so concurrent movements on the same key
    /// serialize; the floor check runs against the locked value.
    async fn apply_balance_delta(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        location_id: Uuid,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        delta: Decimal,
        allow_negative: bool,
    ) -> AppResult<()> {
        let existing: Option<(Uuid, Decimal)> = sqlx::query_as(
            r#"
            SELECT id, quantity FROM stock_balances
            WHERE branch_id = $1 AND location_id = $2 AND product_id = $3
              AND variant_id IS NOT DISTINCT FROM $4
            FOR UPDATE
            "#,
        )
        .bind(branch_id)
        .bind(location_id)
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            Some((id, quantity)) => {
                let new_quantity = quantity + delta;
                if new_quantity < Decimal::ZERO && !allow_negative {
                    return Err(AppError::InsufficientStock(format!(
                        "Balance for product {} at location {} is {}, movement needs {}",
                        product_id, location_id, quantity, -delta
                    )));
                }
                sqlx::query("UPDATE stock_balances SET quantity = $1, updated_at = NOW() WHERE id = $2")
                    .bind(new_quantity)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
            }
            None => {
                if delta < Decimal::ZERO && !allow_negative {
                    return Err(AppError::InsufficientStock(format!(
                        "No stock of product {} at location {}",
                        product_id, location_id
                    )));
                }
                sqlx::query(
                    r#"
                    INSERT INTO stock_balances (branch_id, location_id, product_id, variant_id, quantity)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(branch_id)
                .bind(location_id)
                .bind(product_id)
                .bind(variant_id)
                .bind(delta)
                .execute(&mut **tx)
                .await?;
            }
        }

        Ok(())
    }

    /// Refresh the moving-average cost of a product or variant from an
    /// inbound receipt
    async fn update_average_cost(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        item: &MovementItemInput,
        unit_cost: Decimal,
    ) -> AppResult<()> {
        let on_hand: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0) FROM stock_balances
            WHERE branch_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(branch_id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .fetch_one(&mut **tx)
        .await?;

        match item.variant_id {
            Some(variant_id) => {
                let current: Decimal =
                    sqlx::query_scalar("SELECT avg_cost FROM product_variants WHERE id = $1")
                        .bind(variant_id)
                        .fetch_one(&mut **tx)
                        .await?;
                let new_avg = weighted_average_cost(on_hand, current, item.quantity, unit_cost);
                sqlx::query("UPDATE product_variants SET avg_cost = $1 WHERE id = $2")
                    .bind(new_avg)
                    .bind(variant_id)
                    .execute(&mut **tx)
                    .await?;
            }
            None => {
                let current: Decimal =
                    sqlx::query_scalar("SELECT avg_cost FROM products WHERE id = $1")
                        .bind(item.product_id)
                        .fetch_one(&mut **tx)
                        .await?;
                let new_avg = weighted_average_cost(on_hand, current, item.quantity, unit_cost);
                sqlx::query("UPDATE products SET avg_cost = $1, updated_at = NOW() WHERE id = $2")
                    .bind(new_avg)
                    .bind(item.product_id)
                    .execute(&mut **tx)
                    .await?;
            }
        }

        Ok(())
    }

    async fn ensure_locations(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        input: &RecordMovementInput,
    ) -> AppResult<()> {
        for location_id in [input.from_location_id, input.to_location_id]
            .into_iter()
            .flatten()
        {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM inventory_locations WHERE id = $1 AND branch_id = $2 AND is_active = true)",
            )
            .bind(location_id)
            .bind(branch_id)
            .fetch_one(&mut **tx)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Location".to_string()));
            }
        }
        Ok(())
    }

    async fn ensure_products(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        items: &[MovementItemInput],
    ) -> AppResult<()> {
        for item in items {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND branch_id = $2)",
            )
            .bind(item.product_id)
            .bind(branch_id)
            .fetch_one(&mut **tx)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }
        Ok(())
    }

    async fn fetch_movement(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<MovementWithItems> {
        let movement = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT id, branch_id, movement_number, movement_type, from_location_id,
                   to_location_id, reference_type, reference_id, notes, created_by, created_at
            FROM stock_movements
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(movement_id)
        .bind(branch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))?;

        let items = sqlx::query_as::<_, StockMovementItemRow>(
            r#"
            SELECT id, movement_id, product_id, variant_id, quantity, unit_cost, notes, created_at
            FROM stock_movement_items
            WHERE movement_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(movement_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(MovementWithItems { movement, items })
    }

    /// Get a movement with its items
    pub async fn get_movement(
        &self,
        branch_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<MovementWithItems> {
        let mut tx = self.db.begin().await?;
        let movement = Self::fetch_movement(&mut tx, branch_id, movement_id).await?;
        tx.commit().await?;
        Ok(movement)
    }

    /// List recent movements for a branch
    pub async fn list_movements(
        &self,
        branch_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StockMovementRow>> {
        let movements = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT id, branch_id, movement_number, movement_type, from_location_id,
                   to_location_id, reference_type, reference_id, notes, created_by, created_at
            FROM stock_movements
            WHERE branch_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// List stock balances with product and location context
    pub async fn list_balances(&self, branch_id: Uuid) -> AppResult<Vec<BalanceView>> {
        let balances = sqlx::query_as::<_, BalanceView>(
            r#"
            SELECT sb.id, sb.location_id, il.name AS location_name,
                   sb.product_id, sb.variant_id, p.name AS product_name, p.sku,
                   sb.quantity, sb.reserved_qty, sb.updated_at
            FROM stock_balances sb
            JOIN products p ON p.id = sb.product_id
            JOIN inventory_locations il ON il.id = sb.location_id
            WHERE sb.branch_id = $1
            ORDER BY p.name, il.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(balances)
    }

    /// On-hand quantity for one (location, product, variant) key; zero if
    /// no balance row exists yet
    pub async fn get_quantity(
        &self,
        branch_id: Uuid,
        location_id: Uuid,
        product_id: Uuid,
        variant_id: Option<Uuid>,
    ) -> AppResult<Decimal> {
        let quantity: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT quantity FROM stock_balances
            WHERE branch_id = $1 AND location_id = $2 AND product_id = $3
              AND variant_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(branch_id)
        .bind(location_id)
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quantity.unwrap_or(Decimal::ZERO))
    }

    /// Products whose on-hand total is at or below their minimum stock
    pub async fn list_low_stock(&self, branch_id: Uuid) -> AppResult<Vec<LowStockView>> {
        let rows = sqlx::query_as::<_, LowStockView>(
            r#"
            SELECT p.id AS product_id, p.sku, p.name, p.min_stock,
                   COALESCE(SUM(sb.quantity), 0) AS on_hand
            FROM products p
            LEFT JOIN stock_balances sb ON sb.product_id = p.id
            WHERE p.branch_id = $1 AND p.is_active = true AND p.min_stock > 0
            GROUP BY p.id, p.sku, p.name, p.min_stock
            HAVING COALESCE(SUM(sb.quantity), 0) <= p.min_stock
            ORDER BY p.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

/// Moving-average cost after receiving `quantity` units at `unit_cost`
/// on top of `on_hand` units carried at `current_avg`
pub fn weighted_average_cost(
    on_hand: Decimal,
    current_avg: Decimal,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Decimal {
    if on_hand <= Decimal::ZERO {
        return unit_cost;
    }
    let total = on_hand + quantity;
    if total <= Decimal::ZERO {
        return unit_cost;
    }
    (on_hand * current_avg + quantity * unit_cost) / total
}

/// Whether an error is worth retrying the ledger transaction for:
/// serialization failures, deadlocks, and unique-index races
fn is_transient(err: &AppError) -> bool {
    match err {
        AppError::DatabaseError(sqlx::Error::Database(db)) => matches!(
            db.code().as_deref(),
            Some("40001") | Some("40P01") | Some("23505")
        ),
        _ => false,
    }
}
