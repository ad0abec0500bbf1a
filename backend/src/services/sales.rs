//! Sales service: POS checkout, voiding, and cash sessions
//!
//! Checkout writes the invoice, its items, the payment, the outbound
//! stock movement, and the sales journal in one transaction; either the
//! whole sale exists or none of it does. Catalog name and cost are
//! snapshotted onto the items so later edits do not rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{JournalType, PaymentMethod, StockMovementType};

use crate::error::{AppError, AppResult};
use crate::services::accounting::{AccountingService, JournalLineInput};
use crate::services::document::{next_document_number, DocType};
use crate::services::stock::{MovementItemInput, RecordMovementInput, StockService};

/// Sales service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    /// Rupiah spent per loyalty point earned
    points_per_rupiah: u64,
}

/// A persisted sales invoice
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesInvoiceRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub change_amount: Decimal,
    pub payment_method: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A persisted sales item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A persisted cash session
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CashSessionRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub session_date: NaiveDate,
    pub opening_cash: Decimal,
    pub closing_cash: Option<Decimal>,
    pub expected_cash: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub status: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// An invoice with its items
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: SalesInvoiceRow,
    pub items: Vec<SalesItemRow>,
}

/// One cart line at checkout
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    /// Overrides the catalog sell price when present
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount_amount: Decimal,
}

/// Input for POS checkout
#[derive(Debug, Deserialize)]
pub struct CheckoutInput {
    pub customer_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    /// Location the goods leave from
    pub location_id: Uuid,
    pub items: Vec<CheckoutItemInput>,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Required for cash payments; ignored otherwise
    pub paid_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for opening a cash session
#[derive(Debug, Deserialize)]
pub struct OpenSessionInput {
    pub opening_cash: Decimal,
    pub notes: Option<String>,
}

/// Input for closing a cash session
#[derive(Debug, Deserialize)]
pub struct CloseSessionInput {
    pub closing_cash: Decimal,
    pub notes: Option<String>,
}

/// Catalog data resolved for one cart line
struct ResolvedItem {
    product_id: Uuid,
    variant_id: Option<Uuid>,
    product_name: String,
    quantity: Decimal,
    unit_price: Decimal,
    cost_price: Decimal,
    discount_amount: Decimal,
    subtotal: Decimal,
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool, points_per_rupiah: u64) -> Self {
        Self {
            db,
            points_per_rupiah,
        }
    }

    /// Complete a POS sale
    pub async fn checkout(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        input: CheckoutInput,
    ) -> AppResult<InvoiceWithItems> {
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "Cart is empty",
                "Keranjang kosong",
            ));
        }
        if input.discount_amount < Decimal::ZERO || input.tax_amount < Decimal::ZERO {
            return Err(AppError::validation(
                "discount_amount/tax_amount",
                "Discount and tax cannot be negative",
                "Diskon dan pajak tidak boleh negatif",
            ));
        }

        let mut tx = self.db.begin().await?;

        let resolved = Self::resolve_items(&mut tx, branch_id, &input.items).await?;

        let subtotal: Decimal = resolved.iter().map(|i| i.subtotal).sum();
        if input.discount_amount > subtotal {
            return Err(AppError::validation(
                "discount_amount",
                "Discount exceeds subtotal",
                "Diskon melebihi subtotal",
            ));
        }
        let total = subtotal - input.discount_amount + input.tax_amount;

        let (paid, change) = match input.payment_method {
            PaymentMethod::Cash => {
                let paid = input.paid_amount.ok_or_else(|| {
                    AppError::validation(
                        "paid_amount",
                        "Paid amount is required for cash payments",
                        "Jumlah bayar wajib untuk pembayaran tunai",
                    )
                })?;
                if paid < total {
                    return Err(AppError::validation(
                        "paid_amount",
                        "Paid amount is less than the total",
                        "Jumlah bayar kurang dari total",
                    ));
                }
                (paid, paid - total)
            }
            _ => (total, Decimal::ZERO),
        };

        if let Some(session_id) = input.session_id {
            Self::ensure_open_session(&mut tx, branch_id, session_id).await?;
        }
        if let Some(customer_id) = input.customer_id {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND branch_id = $2)",
            )
            .bind(customer_id)
            .bind(branch_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        let invoice_number =
            next_document_number(&mut *tx, branch_id, DocType::SalesInvoice).await?;

        let invoice = sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            INSERT INTO sales_invoices (
                branch_id, invoice_number, customer_id, session_id, subtotal, discount_amount,
                tax_amount, total_amount, paid_amount, change_amount, payment_method, status,
                notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'completed', $12, $13)
            RETURNING id, branch_id, invoice_number, customer_id, session_id, subtotal,
                      discount_amount, tax_amount, total_amount, paid_amount, change_amount,
                      payment_method, status, notes, created_by, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&invoice_number)
        .bind(input.customer_id)
        .bind(input.session_id)
        .bind(subtotal)
        .bind(input.discount_amount)
        .bind(input.tax_amount)
        .bind(total)
        .bind(paid)
        .bind(change)
        .bind(input.payment_method.as_str())
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(resolved.len());
        for item in &resolved {
            let row = sqlx::query_as::<_, SalesItemRow>(
                r#"
                INSERT INTO sales_items (
                    invoice_id, product_id, variant_id, product_name, quantity,
                    unit_price, cost_price, discount_amount, subtotal
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, invoice_id, product_id, variant_id, product_name, quantity,
                          unit_price, cost_price, discount_amount, subtotal, created_at
                "#,
            )
            .bind(invoice.id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.cost_price)
            .bind(item.discount_amount)
            .bind(item.subtotal)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        sqlx::query(
            "INSERT INTO sales_payments (invoice_id, payment_method, amount) VALUES ($1, $2, $3)",
        )
        .bind(invoice.id)
        .bind(input.payment_method.as_str())
        .bind(paid)
        .execute(&mut *tx)
        .await?;

        // Goods leave stock through the same ledger path as any other
        // movement, inside this transaction
        let movement_input = RecordMovementInput {
            movement_type: StockMovementType::Out,
            from_location_id: Some(input.location_id),
            to_location_id: None,
            items: resolved
                .iter()
                .map(|i| MovementItemInput {
                    product_id: i.product_id,
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    unit_cost: Some(i.cost_price),
                    notes: None,
                })
                .collect(),
            reference_type: Some("sales_invoice".to_string()),
            reference_id: Some(invoice.id),
            notes: Some(format!("Penjualan {}", invoice_number)),
            idempotency_key: None,
            allow_negative: false,
        };
        StockService::record_movement_in_tx(&mut tx, branch_id, Some(user_id), &movement_input)
            .await?;

        let cogs: Decimal = resolved.iter().map(|i| i.cost_price * i.quantity).sum();
        Self::post_sales_journal(&mut tx, branch_id, user_id, &invoice, cogs, false).await?;

        if let Some(customer_id) = input.customer_id {
            let points = self.points_for(total);
            if points > 0 {
                sqlx::query(
                    "UPDATE customers SET points = points + $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(points)
                .bind(customer_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            invoice_number = %invoice.invoice_number,
            total = %invoice.total_amount,
            "sale completed"
        );

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Void a completed invoice: flip the status, return the goods to
    /// stock, reverse the journal, and claw back loyalty points
    pub async fn void_invoice(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> AppResult<SalesInvoiceRow> {
        let mut tx = self.db.begin().await?;

        let invoice = sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            SELECT id, branch_id, invoice_number, customer_id, session_id, subtotal,
                   discount_amount, tax_amount, total_amount, paid_amount, change_amount,
                   payment_method, status, notes, created_by, created_at
            FROM sales_invoices
            WHERE id = $1 AND branch_id = $2
            FOR UPDATE
            "#,
        )
        .bind(invoice_id)
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        if invoice.status != "completed" {
            return Err(AppError::Conflict {
                resource: "sales_invoice".to_string(),
                message: "Only completed invoices can be voided".to_string(),
                message_id: "Hanya faktur selesai yang bisa dibatalkan".to_string(),
            });
        }

        let items = sqlx::query_as::<_, SalesItemRow>(
            r#"
            SELECT id, invoice_id, product_id, variant_id, product_name, quantity,
                   unit_price, cost_price, discount_amount, subtotal, created_at
            FROM sales_items
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        // The outbound movement recorded at checkout tells us where the
        // goods came from
        let source_location: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT from_location_id FROM stock_movements
            WHERE branch_id = $1 AND reference_type = 'sales_invoice' AND reference_id = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(branch_id)
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .flatten();

        let return_location = source_location
            .ok_or_else(|| AppError::Internal("Checkout movement missing for invoice".to_string()))?;

        let movement_input = RecordMovementInput {
            movement_type: StockMovementType::In,
            from_location_id: None,
            to_location_id: Some(return_location),
            items: items
                .iter()
                .map(|i| MovementItemInput {
                    product_id: i.product_id,
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    unit_cost: None,
                    notes: None,
                })
                .collect(),
            reference_type: Some("sales_invoice_void".to_string()),
            reference_id: Some(invoice_id),
            notes: Some(format!("Pembatalan {}", invoice.invoice_number)),
            idempotency_key: None,
            allow_negative: false,
        };
        StockService::record_movement_in_tx(&mut tx, branch_id, Some(user_id), &movement_input)
            .await?;

        let cogs: Decimal = items.iter().map(|i| i.cost_price * i.quantity).sum();
        Self::post_sales_journal(&mut tx, branch_id, user_id, &invoice, cogs, true).await?;

        if let Some(customer_id) = invoice.customer_id {
            let points = self.points_for(invoice.total_amount);
            if points > 0 {
                sqlx::query(
                    "UPDATE customers SET points = GREATEST(points - $1, 0), updated_at = NOW() WHERE id = $2",
                )
                .bind(points)
                .bind(customer_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let voided = sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            UPDATE sales_invoices SET status = 'voided'
            WHERE id = $1
            RETURNING id, branch_id, invoice_number, customer_id, session_id, subtotal,
                      discount_amount, tax_amount, total_amount, paid_amount, change_amount,
                      payment_method, status, notes, created_by, created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(voided)
    }

    /// Sales journal for a checkout, or its mirror image for a void
    async fn post_sales_journal(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        user_id: Uuid,
        invoice: &SalesInvoiceRow,
        cogs: Decimal,
        reverse: bool,
    ) -> AppResult<()> {
        let kas = AccountingService::account_id_by_code(tx, branch_id, "1000").await?;
        let persediaan = AccountingService::account_id_by_code(tx, branch_id, "1200").await?;
        let pendapatan = AccountingService::account_id_by_code(tx, branch_id, "4000").await?;
        let hpp = AccountingService::account_id_by_code(tx, branch_id, "5000").await?;

        let total = invoice.total_amount;
        let mut lines = vec![
            JournalLineInput {
                account_id: kas,
                debit: total,
                credit: Decimal::ZERO,
                description: Some(format!("Pembayaran {}", invoice.payment_method)),
            },
            JournalLineInput {
                account_id: pendapatan,
                debit: Decimal::ZERO,
                credit: total,
                description: None,
            },
        ];
        if cogs > Decimal::ZERO {
            lines.push(JournalLineInput {
                account_id: hpp,
                debit: cogs,
                credit: Decimal::ZERO,
                description: None,
            });
            lines.push(JournalLineInput {
                account_id: persediaan,
                debit: Decimal::ZERO,
                credit: cogs,
                description: None,
            });
        }

        let (journal_type, reference_type) = if reverse {
            // Swap the sides to undo the original posting
            for line in &mut lines {
                std::mem::swap(&mut line.debit, &mut line.credit);
            }
            (JournalType::Return, "sales_invoice_void")
        } else {
            (JournalType::Sale, "sales_invoice")
        };

        AccountingService::create_entry_in_tx(
            tx,
            branch_id,
            Some(user_id),
            journal_type,
            Utc::now().date_naive(),
            Some(reference_type),
            Some(invoice.id),
            Some(&format!("Penjualan {}", invoice.invoice_number)),
            &lines,
            true,
        )
        .await?;

        Ok(())
    }

    fn points_for(&self, total: Decimal) -> i64 {
        if self.points_per_rupiah == 0 {
            return 0;
        }
        (total / Decimal::from(self.points_per_rupiah))
            .floor()
            .to_i64()
            .unwrap_or(0)
    }

    async fn resolve_items(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        items: &[CheckoutItemInput],
    ) -> AppResult<Vec<ResolvedItem>> {
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity <= Decimal::ZERO {
                return Err(AppError::validation(
                    "quantity",
                    "Quantity must be positive",
                    "Jumlah harus positif",
                ));
            }
            if item.discount_amount < Decimal::ZERO {
                return Err(AppError::validation(
                    "discount_amount",
                    "Discount cannot be negative",
                    "Diskon tidak boleh negatif",
                ));
            }

            let product: Option<(String, Decimal, Decimal, Decimal, bool)> = sqlx::query_as(
                "SELECT name, sell_price, avg_cost, buy_price, is_active FROM products WHERE id = $1 AND branch_id = $2",
            )
            .bind(item.product_id)
            .bind(branch_id)
            .fetch_optional(&mut **tx)
            .await?;

            let (name, mut sell_price, mut avg_cost, mut buy_price, is_active) =
                product.ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            if !is_active {
                return Err(AppError::validation(
                    "product_id",
                    "Product is inactive",
                    "Produk tidak aktif",
                ));
            }

            if let Some(variant_id) = item.variant_id {
                let variant: Option<(Decimal, Decimal, Decimal)> = sqlx::query_as(
                    "SELECT sell_price, avg_cost, buy_price FROM product_variants WHERE id = $1 AND product_id = $2 AND is_active = true",
                )
                .bind(variant_id)
                .bind(item.product_id)
                .fetch_optional(&mut **tx)
                .await?;
                let (v_sell, v_avg, v_buy) =
                    variant.ok_or_else(|| AppError::NotFound("Product variant".to_string()))?;
                sell_price = v_sell;
                avg_cost = v_avg;
                buy_price = v_buy;
            }

            let unit_price = item.unit_price.unwrap_or(sell_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::validation(
                    "unit_price",
                    "Unit price cannot be negative",
                    "Harga satuan tidak boleh negatif",
                ));
            }
            let cost_price = if avg_cost > Decimal::ZERO {
                avg_cost
            } else {
                buy_price
            };
            let subtotal = item.quantity * unit_price - item.discount_amount;
            if subtotal < Decimal::ZERO {
                return Err(AppError::validation(
                    "discount_amount",
                    "Item discount exceeds the line amount",
                    "Diskon item melebihi nilai baris",
                ));
            }

            resolved.push(ResolvedItem {
                product_id: item.product_id,
                variant_id: item.variant_id,
                product_name: name,
                quantity: item.quantity,
                unit_price,
                cost_price,
                discount_amount: item.discount_amount,
                subtotal,
            });
        }
        Ok(resolved)
    }

    async fn ensure_open_session(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        session_id: Uuid,
    ) -> AppResult<()> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM cash_sessions WHERE id = $1 AND branch_id = $2",
        )
        .bind(session_id)
        .bind(branch_id)
        .fetch_optional(&mut **tx)
        .await?;

        match status.as_deref() {
            None => Err(AppError::NotFound("Cash session".to_string())),
            Some("open") => Ok(()),
            Some(_) => Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "Cash session is closed".to_string(),
                message_id: "Sesi kas sudah ditutup".to_string(),
            }),
        }
    }

    /// Open a cash session for the current cashier
    pub async fn open_session(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        input: OpenSessionInput,
    ) -> AppResult<CashSessionRow> {
        if input.opening_cash < Decimal::ZERO {
            return Err(AppError::validation(
                "opening_cash",
                "Opening cash cannot be negative",
                "Kas awal tidak boleh negatif",
            ));
        }

        let existing: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cash_sessions WHERE branch_id = $1 AND user_id = $2 AND status = 'open')",
        )
        .bind(branch_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if existing {
            return Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "An open cash session already exists".to_string(),
                message_id: "Masih ada sesi kas yang terbuka".to_string(),
            });
        }

        let session = sqlx::query_as::<_, CashSessionRow>(
            r#"
            INSERT INTO cash_sessions (branch_id, user_id, session_date, opening_cash, notes)
            VALUES ($1, $2, CURRENT_DATE, $3, $4)
            RETURNING id, branch_id, user_id, session_date, opening_cash, closing_cash,
                      expected_cash, difference, status, opened_at, closed_at, notes
            "#,
        )
        .bind(branch_id)
        .bind(user_id)
        .bind(input.opening_cash)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(session)
    }

    /// Close a cash session; expected cash is the opening float plus the
    /// session's completed cash sales
    pub async fn close_session(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
        input: CloseSessionInput,
    ) -> AppResult<CashSessionRow> {
        let mut tx = self.db.begin().await?;

        let session = sqlx::query_as::<_, CashSessionRow>(
            r#"
            SELECT id, branch_id, user_id, session_date, opening_cash, closing_cash,
                   expected_cash, difference, status, opened_at, closed_at, notes
            FROM cash_sessions
            WHERE id = $1 AND branch_id = $2
            FOR UPDATE
            "#,
        )
        .bind(session_id)
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Cash session".to_string()))?;

        if session.status != "open" {
            return Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "Cash session is already closed".to_string(),
                message_id: "Sesi kas sudah ditutup".to_string(),
            });
        }
        if session.user_id != user_id {
            return Err(AppError::InsufficientPermissions);
        }

        let cash_sales: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) FROM sales_invoices
            WHERE session_id = $1 AND status = 'completed' AND payment_method = 'cash'
            "#,
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let expected = session.opening_cash + cash_sales;
        let difference = input.closing_cash - expected;

        let closed = sqlx::query_as::<_, CashSessionRow>(
            r#"
            UPDATE cash_sessions
            SET closing_cash = $1, expected_cash = $2, difference = $3, status = 'closed',
                closed_at = NOW(), notes = COALESCE($4, notes)
            WHERE id = $5
            RETURNING id, branch_id, user_id, session_date, opening_cash, closing_cash,
                      expected_cash, difference, status, opened_at, closed_at, notes
            "#,
        )
        .bind(input.closing_cash)
        .bind(expected)
        .bind(difference)
        .bind(&input.notes)
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(closed)
    }

    /// List recent invoices for a branch
    pub async fn list_invoices(
        &self,
        branch_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<SalesInvoiceRow>> {
        let invoices = sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            SELECT id, branch_id, invoice_number, customer_id, session_id, subtotal,
                   discount_amount, tax_amount, total_amount, paid_amount, change_amount,
                   payment_method, status, notes, created_by, created_at
            FROM sales_invoices
            WHERE branch_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(invoices)
    }

    /// Get one invoice with its items
    pub async fn get_invoice(
        &self,
        branch_id: Uuid,
        invoice_id: Uuid,
    ) -> AppResult<InvoiceWithItems> {
        let invoice = sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            SELECT id, branch_id, invoice_number, customer_id, session_id, subtotal,
                   discount_amount, tax_amount, total_amount, paid_amount, change_amount,
                   payment_method, status, notes, created_by, created_at
            FROM sales_invoices
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(invoice_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        let items = sqlx::query_as::<_, SalesItemRow>(
            r#"
            SELECT id, invoice_id, product_id, variant_id, product_name, quantity,
                   unit_price, cost_price, discount_amount, subtotal, created_at
            FROM sales_items
            WHERE invoice_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InvoiceWithItems { invoice, items })
    }
}
