//! Domain models for the Toko Ponsel POS platform

mod accounting;
mod branch;
mod inventory;
mod partner;
mod product;
mod sales;
mod service;
mod user;

pub use accounting::*;
pub use branch::*;
pub use inventory::*;
pub use partner::*;
pub use product::*;
pub use sales::*;
pub use service::*;
pub use user::*;
