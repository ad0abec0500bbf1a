//! Service (repair) ticket models
//!
//! Ticket statuses form a closed transition graph; anything outside the
//! graph is an invalid state transition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Repair ticket statuses, in the shop's own terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    /// Device received at the counter
    #[serde(rename = "DITERIMA")]
    Diterima,
    /// Under diagnosis
    #[serde(rename = "DIAGNOSA")]
    Diagnosa,
    /// Waiting for spare parts
    #[serde(rename = "MENUNGGU_SPAREPART")]
    MenungguSparepart,
    /// Repair in progress
    #[serde(rename = "PROSES")]
    Proses,
    /// Repair done, ready for pickup
    #[serde(rename = "SELESAI")]
    Selesai,
    /// Picked up by the customer
    #[serde(rename = "DIAMBIL")]
    Diambil,
    /// Cancelled
    #[serde(rename = "BATAL")]
    Batal,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Diterima => "DITERIMA",
            ServiceStatus::Diagnosa => "DIAGNOSA",
            ServiceStatus::MenungguSparepart => "MENUNGGU_SPAREPART",
            ServiceStatus::Proses => "PROSES",
            ServiceStatus::Selesai => "SELESAI",
            ServiceStatus::Diambil => "DIAMBIL",
            ServiceStatus::Batal => "BATAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DITERIMA" => Some(ServiceStatus::Diterima),
            "DIAGNOSA" => Some(ServiceStatus::Diagnosa),
            "MENUNGGU_SPAREPART" => Some(ServiceStatus::MenungguSparepart),
            "PROSES" => Some(ServiceStatus::Proses),
            "SELESAI" => Some(ServiceStatus::Selesai),
            "DIAMBIL" => Some(ServiceStatus::Diambil),
            "BATAL" => Some(ServiceStatus::Batal),
            _ => None,
        }
    }

    /// Terminal states allow no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceStatus::Diambil | ServiceStatus::Batal)
    }

    /// A ticket is active until it is picked up or cancelled
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ServiceStatus::Selesai | ServiceStatus::Diambil | ServiceStatus::Batal
        )
    }

    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        use ServiceStatus::*;
        match self {
            Diterima => matches!(next, Diagnosa | Proses | Batal),
            Diagnosa => matches!(next, MenungguSparepart | Proses | Batal),
            MenungguSparepart => matches!(next, Proses | Batal),
            Proses => matches!(next, Selesai | Batal),
            Selesai => matches!(next, Diambil),
            Diambil | Batal => false,
        }
    }
}

/// Ticket line item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceItemType {
    /// Spare part taken from stock
    Sparepart,
    /// Labor / service fee
    Jasa,
}

impl ServiceItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceItemType::Sparepart => "sparepart",
            ServiceItemType::Jasa => "jasa",
        }
    }
}

/// Service payment kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServicePaymentType {
    /// Down payment taken at intake
    Dp,
    /// Settlement at pickup
    Pelunasan,
}

impl ServicePaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePaymentType::Dp => "dp",
            ServicePaymentType::Pelunasan => "pelunasan",
        }
    }
}

/// A repair ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTicket {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub ticket_number: String,
    pub customer_id: Option<Uuid>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub device_imei: Option<String>,
    pub device_color: Option<String>,
    pub complaint: String,
    pub diagnosis: Option<String>,
    pub estimated_cost: Decimal,
    pub final_cost: Decimal,
    pub dp_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: ServiceStatus,
    pub technician_id: Option<Uuid>,
    pub received_by: Option<Uuid>,
    pub received_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on a repair ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTicketItem {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub item_type: ServiceItemType,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A payment applied to a repair ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePayment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub payment_type: ServicePaymentType,
    pub payment_method: crate::models::PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
