//! Shared types and models for the Toko Ponsel POS platform
//!
//! This crate contains types shared between the backend server and any
//! future client components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
