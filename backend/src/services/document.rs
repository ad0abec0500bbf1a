//! Document numbering
//!
//! Human-readable sequential numbers (`STK/202503/0001`) are owned by the
//! `generate_document_number` SQL function, scoped to (branch, doc type,
//! year-month). The function serializes concurrent callers on the
//! sequence row, so numbers are collision-free; application code only
//! ever calls it, never touches `document_sequences` directly.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;

/// Document types with their number prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    StockMovement,
    SalesInvoice,
    ServiceTicket,
    JournalEntry,
}

impl DocType {
    pub fn code(&self) -> &'static str {
        match self {
            DocType::StockMovement => "STK",
            DocType::SalesInvoice => "INV",
            DocType::ServiceTicket => "SRV",
            DocType::JournalEntry => "JRN",
        }
    }
}

/// Fetch the next document number for a branch.
///
/// Takes a connection rather than the pool so callers can number
/// documents inside the same transaction that creates them.
pub async fn next_document_number(
    conn: &mut PgConnection,
    branch_id: Uuid,
    doc_type: DocType,
) -> AppResult<String> {
    let number: String = sqlx::query_scalar("SELECT generate_document_number($1, $2)")
        .bind(branch_id)
        .bind(doc_type.code())
        .fetch_one(conn)
        .await?;

    Ok(number)
}
