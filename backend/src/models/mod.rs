//! Database models for the Toko Ponsel POS platform
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
