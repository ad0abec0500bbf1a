//! Double-entry accounting models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chart-of-accounts account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountType::Asset),
            "liability" => Some(AccountType::Liability),
            "equity" => Some(AccountType::Equity),
            "revenue" => Some(AccountType::Revenue),
            "expense" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Debits increase asset and expense accounts; credits increase the rest
    pub fn debit_increases(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }
}

/// Journal entry sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalType {
    Sale,
    Purchase,
    Service,
    Return,
    CashEvent,
    Adjustment,
}

impl JournalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalType::Sale => "sale",
            JournalType::Purchase => "purchase",
            JournalType::Service => "service",
            JournalType::Return => "return",
            JournalType::CashEvent => "cash_event",
            JournalType::Adjustment => "adjustment",
        }
    }
}

/// A chart-of-accounts account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoaAccount {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A journal entry header; debits must equal credits across its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub journal_type: JournalType,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_posted: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One side of a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
