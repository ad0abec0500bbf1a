//! User, role, and capability models
//!
//! Roles are a closed enumeration; every operation is gated by a
//! capability derived from the user's role set, evaluated once per
//! request rather than scattered across pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    /// Business owner, full access
    Owner,
    /// Branch administrator
    Admin,
    /// Cashier (kasir)
    Kasir,
    /// Repair technician (teknisi)
    Teknisi,
    /// Warehouse staff (gudang)
    Gudang,
}

impl AppRole {
    pub const ALL: [AppRole; 5] = [
        AppRole::Owner,
        AppRole::Admin,
        AppRole::Kasir,
        AppRole::Teknisi,
        AppRole::Gudang,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Owner => "owner",
            AppRole::Admin => "admin",
            AppRole::Kasir => "kasir",
            AppRole::Teknisi => "teknisi",
            AppRole::Gudang => "gudang",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(AppRole::Owner),
            "admin" => Some(AppRole::Admin),
            "kasir" => Some(AppRole::Kasir),
            "teknisi" => Some(AppRole::Teknisi),
            "gudang" => Some(AppRole::Gudang),
            _ => None,
        }
    }

    /// Capabilities granted by this role
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            AppRole::Owner => &[
                ManageBranches,
                ManageUsers,
                ManageProducts,
                RecordStockMovements,
                ViewInventory,
                Checkout,
                VoidSales,
                ManageCashSessions,
                ManageServiceTickets,
                ManageCustomers,
                ManageAccounting,
                ViewReports,
            ],
            AppRole::Admin => &[
                ManageUsers,
                ManageProducts,
                RecordStockMovements,
                ViewInventory,
                Checkout,
                VoidSales,
                ManageCashSessions,
                ManageServiceTickets,
                ManageCustomers,
                ManageAccounting,
                ViewReports,
            ],
            AppRole::Kasir => &[
                ViewInventory,
                Checkout,
                ManageCashSessions,
                ManageCustomers,
            ],
            AppRole::Teknisi => &[ViewInventory, ManageServiceTickets, ManageCustomers],
            AppRole::Gudang => &[ManageProducts, RecordStockMovements, ViewInventory],
        }
    }
}

/// Fine-grained operations a role may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageBranches,
    ManageUsers,
    ManageProducts,
    RecordStockMovements,
    ViewInventory,
    Checkout,
    VoidSales,
    ManageCashSessions,
    ManageServiceTickets,
    ManageCustomers,
    ManageAccounting,
    ViewReports,
}

/// A user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub branch_id: Option<Uuid>,
    pub roles: Vec<AppRole>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Check whether any of the given roles grants a capability
pub fn roles_allow(roles: &[AppRole], capability: Capability) -> bool {
    roles
        .iter()
        .any(|role| role.capabilities().contains(&capability))
}
