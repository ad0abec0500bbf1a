//! Route definitions for the Toko Ponsel POS platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - branch and locations
        .nest("/branch", branch_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - customers and suppliers
        .nest("/customers", customer_routes())
        .nest("/suppliers", supplier_routes())
        // Protected routes - POS sales
        .nest("/sales", sales_routes())
        // Protected routes - service tickets
        .nest("/service", service_routes())
        // Protected routes - accounting
        .nest("/accounting", accounting_routes())
        // Protected routes - reports
        .nest("/reports", reporting_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Branch management routes (protected)
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_branch).put(handlers::update_branch))
        .route(
            "/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route(
            "/:product_id/variants",
            get(handlers::list_variants).post(handlers::create_variant),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route("/movements/:movement_id", get(handlers::get_movement))
        .route("/balances", get(handlers::list_balances))
        .route("/quantity", get(handlers::get_quantity))
        .route("/low", get(handlers::list_low_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer).put(handlers::update_customer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// POS sales routes (protected)
fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handlers::checkout))
        .route(
            "/invoices",
            get(handlers::list_invoices),
        )
        .route("/invoices/:invoice_id", get(handlers::get_invoice))
        .route("/invoices/:invoice_id/void", post(handlers::void_invoice))
        .route("/sessions", post(handlers::open_cash_session))
        .route(
            "/sessions/:session_id/close",
            post(handlers::close_cash_session),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Service ticket routes (protected)
fn service_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route("/tickets/:ticket_id", get(handlers::get_ticket))
        .route(
            "/tickets/:ticket_id/status",
            put(handlers::update_ticket_status),
        )
        .route("/tickets/:ticket_id/items", post(handlers::add_ticket_item))
        .route(
            "/tickets/:ticket_id/payments",
            post(handlers::record_ticket_payment),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Accounting routes (protected)
fn accounting_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/journal",
            get(handlers::list_journal_entries).post(handlers::create_journal_entry),
        )
        .route("/journal/:entry_id", get(handlers::get_journal_entry))
        .route("/journal/:entry_id/post", post(handlers::post_journal_entry))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn reporting_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/revenue", get(handlers::get_revenue_report))
        .route("/top-products", get(handlers::get_top_products))
        .route_layer(middleware::from_fn(auth_middleware))
}
