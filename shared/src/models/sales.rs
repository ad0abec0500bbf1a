//! Sales and cash session models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment methods accepted at the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Qris,
    Split,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Qris => "qris",
            PaymentMethod::Split => "split",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "transfer" => Some(PaymentMethod::Transfer),
            "qris" => Some(PaymentMethod::Qris),
            "split" => Some(PaymentMethod::Split),
            _ => None,
        }
    }
}

/// Invoice lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Completed,
    Voided,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Completed => "completed",
            InvoiceStatus::Voided => "voided",
        }
    }
}

/// A sales invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub change_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A line item of a sales invoice; product name and cost are snapshotted
/// at sale time so later catalog edits do not rewrite history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A payment applied to an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesPayment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cash drawer session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashSessionStatus {
    Open,
    Closed,
}

impl CashSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashSessionStatus::Open => "open",
            CashSessionStatus::Closed => "closed",
        }
    }
}

/// A cash drawer session for one cashier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub session_date: NaiveDate,
    pub opening_cash: Decimal,
    pub closing_cash: Option<Decimal>,
    pub expected_cash: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub status: CashSessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
