//! Reporting service for dashboards, revenue reports, and data export

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard metrics for the landing page
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub today_sales: Decimal,
    pub today_transactions: i64,
    pub active_services: i64,
    pub low_stock_items: i64,
    pub month_revenue: Decimal,
}

/// One day of the revenue report
#[derive(Debug, Serialize)]
pub struct RevenueReportRow {
    pub date: NaiveDate,
    pub sales_revenue: Decimal,
    pub service_revenue: Decimal,
    pub total_revenue: Decimal,
    pub cogs: Decimal,
    pub gross_profit: Decimal,
}

/// A best-selling product over the report period
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_name: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}

/// Report filter parameters
#[derive(Debug, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    /// Effective range; defaults to the current month so far
    fn range(&self) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        (
            self.start_date.unwrap_or(month_start),
            self.end_date.unwrap_or(today),
        )
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get dashboard metrics
    pub async fn get_dashboard_metrics(&self, branch_id: Uuid) -> AppResult<DashboardMetrics> {
        let (today_sales, today_transactions): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_amount), 0), COUNT(*)
            FROM sales_invoices
            WHERE branch_id = $1 AND status = 'completed' AND created_at::DATE = CURRENT_DATE
            "#,
        )
        .bind(branch_id)
        .fetch_one(&self.db)
        .await?;

        let active_services: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM service_tickets
            WHERE branch_id = $1 AND status NOT IN ('SELESAI', 'DIAMBIL', 'BATAL')
            "#,
        )
        .bind(branch_id)
        .fetch_one(&self.db)
        .await?;

        let low_stock_items: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM (
                SELECT p.id
                FROM products p
                LEFT JOIN stock_balances sb ON sb.product_id = p.id
                WHERE p.branch_id = $1 AND p.is_active = true AND p.min_stock > 0
                GROUP BY p.id, p.min_stock
                HAVING COALESCE(SUM(sb.quantity), 0) <= p.min_stock
            ) low
            "#,
        )
        .bind(branch_id)
        .fetch_one(&self.db)
        .await?;

        let month_revenue: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0)
            FROM sales_invoices
            WHERE branch_id = $1 AND status = 'completed'
              AND created_at >= date_trunc('month', CURRENT_DATE)
            "#,
        )
        .bind(branch_id)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            today_sales,
            today_transactions,
            active_services,
            low_stock_items,
            month_revenue,
        })
    }

    /// Daily revenue report over the filter period.
    ///
    /// Sales revenue comes from completed invoices, service revenue from
    /// ticket payments, COGS from the cost snapshots on sold items.
    pub async fn get_revenue_report(
        &self,
        branch_id: Uuid,
        filter: &ReportFilter,
    ) -> AppResult<Vec<RevenueReportRow>> {
        let (start, end) = filter.range();
        if start > end {
            return Err(AppError::validation(
                "start_date",
                "Start date is after end date",
                "Tanggal mulai melewati tanggal akhir",
            ));
        }

        let sales: Vec<(NaiveDate, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT si.created_at::DATE AS day,
                   COALESCE(SUM(si.total_amount), 0) AS revenue,
                   COALESCE(SUM(items.cogs), 0) AS cogs
            FROM sales_invoices si
            LEFT JOIN (
                SELECT invoice_id, SUM(cost_price * quantity) AS cogs
                FROM sales_items
                GROUP BY invoice_id
            ) items ON items.invoice_id = si.id
            WHERE si.branch_id = $1 AND si.status = 'completed'
              AND si.created_at::DATE BETWEEN $2 AND $3
            GROUP BY si.created_at::DATE
            "#,
        )
        .bind(branch_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let service: Vec<(NaiveDate, Decimal)> = sqlx::query_as(
            r#"
            SELECT sp.created_at::DATE AS day, COALESCE(SUM(sp.amount), 0) AS revenue
            FROM service_payments sp
            JOIN service_tickets st ON st.id = sp.ticket_id
            WHERE st.branch_id = $1 AND sp.created_at::DATE BETWEEN $2 AND $3
            GROUP BY sp.created_at::DATE
            "#,
        )
        .bind(branch_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let mut days: BTreeMap<NaiveDate, RevenueReportRow> = BTreeMap::new();
        for (day, revenue, cogs) in sales {
            let row = days.entry(day).or_insert_with(|| empty_row(day));
            row.sales_revenue += revenue;
            row.cogs += cogs;
        }
        for (day, revenue) in service {
            let row = days.entry(day).or_insert_with(|| empty_row(day));
            row.service_revenue += revenue;
        }
        for row in days.values_mut() {
            row.total_revenue = row.sales_revenue + row.service_revenue;
            row.gross_profit = row.total_revenue - row.cogs;
        }

        Ok(days.into_values().collect())
    }

    /// Best-selling products over the filter period
    pub async fn get_top_products(
        &self,
        branch_id: Uuid,
        filter: &ReportFilter,
        limit: i64,
    ) -> AppResult<Vec<TopProduct>> {
        let (start, end) = filter.range();

        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT si.product_name,
                   COALESCE(SUM(si.quantity), 0) AS quantity,
                   COALESCE(SUM(si.subtotal), 0) AS revenue
            FROM sales_items si
            JOIN sales_invoices inv ON inv.id = si.invoice_id
            WHERE inv.branch_id = $1 AND inv.status = 'completed'
              AND inv.created_at::DATE BETWEEN $2 AND $3
            GROUP BY si.product_name
            ORDER BY revenue DESC
            LIMIT $4
            "#,
        )
        .bind(branch_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Export report rows as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))?;

        Ok(csv_data)
    }
}

fn empty_row(date: NaiveDate) -> RevenueReportRow {
    RevenueReportRow {
        date,
        sales_revenue: Decimal::ZERO,
        service_revenue: Decimal::ZERO,
        total_revenue: Decimal::ZERO,
        cogs: Decimal::ZERO,
        gross_profit: Decimal::ZERO,
    }
}
