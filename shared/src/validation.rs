//! Validation utilities for the Toko Ponsel POS platform
//!
//! Pure checks shared by the backend services and their tests.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::StockMovementType;

// ============================================================================
// Stock Ledger Validations
// ============================================================================

/// Validate the location requirements of a stock movement type.
///
/// IN and ADJUSTMENT require a destination; OUT requires a source;
/// TRANSFER requires both and the two must differ.
pub fn validate_movement_locations(
    movement_type: StockMovementType,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
) -> Result<(), &'static str> {
    if movement_type.requires_source() && from_location_id.is_none() {
        return Err("Source location is required for this movement type");
    }
    if movement_type.requires_destination() && to_location_id.is_none() {
        return Err("Destination location is required for this movement type");
    }
    if movement_type == StockMovementType::Transfer && from_location_id == to_location_id {
        return Err("Transfer source and destination must differ");
    }
    Ok(())
}

/// Validate a movement quantity (always entered positive)
pub fn validate_movement_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

// ============================================================================
// Accounting Validations
// ============================================================================

/// Validate that a set of journal lines balances (total debits = total
/// credits, both positive, no line carrying both sides)
pub fn validate_journal_lines(lines: &[(Decimal, Decimal)]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("A journal entry needs at least one line");
    }
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    for (debit, credit) in lines {
        if *debit < Decimal::ZERO || *credit < Decimal::ZERO {
            return Err("Journal amounts cannot be negative");
        }
        if *debit > Decimal::ZERO && *credit > Decimal::ZERO {
            return Err("A journal line cannot carry both a debit and a credit");
        }
        total_debit += debit;
        total_credit += credit;
    }
    if total_debit != total_credit {
        return Err("Journal entry is not balanced");
    }
    if total_debit == Decimal::ZERO {
        return Err("Journal entry cannot be empty");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate an Indonesian phone number (08xxxxxxxxxx or +62 form)
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone
        .strip_prefix("+62")
        .map(|rest| format!("0{}", rest))
        .unwrap_or_else(|| phone.to_string());

    if digits.len() < 9 || digits.len() > 14 {
        return Err("Phone number must be 9-14 digits");
    }
    if !digits.starts_with('0') {
        return Err("Phone number must start with 0 or +62");
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number may contain digits only");
    }
    Ok(())
}

/// Validate a short entity code (branch, location, supplier): 2-10
/// uppercase alphanumeric characters
pub fn validate_entity_code(code: &str) -> Result<(), &'static str> {
    if code.len() >= 2
        && code.len() <= 10
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        Ok(())
    } else {
        Err("Code must be 2-10 uppercase alphanumeric characters")
    }
}

/// Validate a monetary amount is non-negative
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}
