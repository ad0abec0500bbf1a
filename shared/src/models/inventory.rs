//! Stock ledger models
//!
//! Stock movements form an append-only ledger; stock balances are the
//! materialized view of that ledger per (branch, location, product,
//! variant) key and may only change as a side effect of recording a
//! movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockMovementType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "ADJUSTMENT")]
    Adjustment,
    #[serde(rename = "TRANSFER")]
    Transfer,
}

impl StockMovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMovementType::In => "IN",
            StockMovementType::Out => "OUT",
            StockMovementType::Adjustment => "ADJUSTMENT",
            StockMovementType::Transfer => "TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(StockMovementType::In),
            "OUT" => Some(StockMovementType::Out),
            "ADJUSTMENT" => Some(StockMovementType::Adjustment),
            "TRANSFER" => Some(StockMovementType::Transfer),
            _ => None,
        }
    }

    /// IN and ADJUSTMENT stock into a destination; OUT takes from a source;
    /// TRANSFER does both.
    pub fn requires_source(&self) -> bool {
        matches!(self, StockMovementType::Out | StockMovementType::Transfer)
    }

    pub fn requires_destination(&self) -> bool {
        matches!(
            self,
            StockMovementType::In | StockMovementType::Adjustment | StockMovementType::Transfer
        )
    }
}

/// An append-only stock movement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub movement_number: String,
    pub movement_type: StockMovementType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A line item of a stock movement; quantity is always entered positive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementItem {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Current on-hand quantity per (branch, location, product, variant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBalance {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    pub reserved_qty: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// The signed balance change a movement applies to one location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub location_id: Uuid,
    pub delta: Decimal,
}

/// Resolve the balance deltas a movement of `quantity` applies: IN and
/// ADJUSTMENT credit the destination, OUT debits the source, TRANSFER
/// does both. Fails if the locations the type needs are missing.
pub fn movement_deltas(
    movement_type: StockMovementType,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    quantity: Decimal,
) -> Result<Vec<BalanceDelta>, &'static str> {
    match (movement_type, from_location_id, to_location_id) {
        (StockMovementType::In | StockMovementType::Adjustment, _, Some(dest)) => {
            Ok(vec![BalanceDelta {
                location_id: dest,
                delta: quantity,
            }])
        }
        (StockMovementType::Out, Some(source), _) => Ok(vec![BalanceDelta {
            location_id: source,
            delta: -quantity,
        }]),
        (StockMovementType::Transfer, Some(source), Some(dest)) => Ok(vec![
            BalanceDelta {
                location_id: source,
                delta: -quantity,
            },
            BalanceDelta {
                location_id: dest,
                delta: quantity,
            },
        ]),
        _ => Err("Movement is missing a required location"),
    }
}
