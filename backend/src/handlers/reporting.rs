//! Reporting handlers for analytics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use shared::models::Capability;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{DashboardMetrics, ReportFilter, ReportingService, TopProduct};
use crate::AppState;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Deserialize)]
pub struct TopProductsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

fn parse_filter(start_date: Option<String>, end_date: Option<String>) -> ReportFilter {
    ReportFilter {
        start_date: start_date.and_then(|s| s.parse().ok()),
        end_date: end_date.and_then(|s| s.parse().ok()),
    }
}

/// Get dashboard metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db.clone());
    let metrics = service
        .get_dashboard_metrics(current_user.0.branch_id)
        .await?;
    Ok(Json(metrics))
}

/// Get the daily revenue report, as JSON or CSV
pub async fn get_revenue_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require(Capability::ViewReports)?;

    let service = ReportingService::new(state.db.clone());
    let filter = parse_filter(query.start_date, query.end_date);
    let data = service
        .get_revenue_report(current_user.0.branch_id, &filter)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"revenue_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get the best-selling products over a period
pub async fn get_top_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TopProductsQuery>,
) -> AppResult<Json<Vec<TopProduct>>> {
    current_user.0.require(Capability::ViewReports)?;

    let service = ReportingService::new(state.db.clone());
    let filter = parse_filter(query.start_date, query.end_date);
    let products = service
        .get_top_products(current_user.0.branch_id, &filter, query.limit.unwrap_or(5))
        .await?;
    Ok(Json(products))
}
