//! Business logic services for the Toko Ponsel POS platform

pub mod accounting;
pub mod auth;
pub mod branch;
pub mod customer;
pub mod document;
pub mod product;
pub mod reporting;
pub mod sales;
pub mod service_ticket;
pub mod stock;
pub mod supplier;

pub use accounting::AccountingService;
pub use auth::AuthService;
pub use branch::BranchService;
pub use customer::CustomerService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use sales::SalesService;
pub use service_ticket::ServiceTicketService;
pub use stock::StockService;
pub use supplier::SupplierService;
