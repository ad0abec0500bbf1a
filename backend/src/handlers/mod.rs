//! HTTP handlers for the Toko Ponsel POS platform

pub mod accounting;
pub mod auth;
pub mod branch;
pub mod customer;
pub mod health;
pub mod product;
pub mod reporting;
pub mod sales;
pub mod service_ticket;
pub mod stock;
pub mod supplier;

pub use accounting::*;
pub use auth::*;
pub use branch::*;
pub use customer::*;
pub use health::*;
pub use product::*;
pub use reporting::*;
pub use sales::*;
pub use service_ticket::*;
pub use stock::*;
pub use supplier::*;
