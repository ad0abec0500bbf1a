//! Shared validation tests

use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::validation::{validate_amount, validate_email, validate_entity_code, validate_phone};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn local_phone_numbers_pass() {
        assert!(validate_phone("081234567890").is_ok());
        assert!(validate_phone("0274123456").is_ok());
    }

    #[test]
    fn international_prefix_passes() {
        assert!(validate_phone("+6281234567890").is_ok());
    }

    #[test]
    fn malformed_phone_numbers_fail() {
        assert!(validate_phone("81234567890").is_err()); // missing leading 0
        assert!(validate_phone("0812-345-678").is_err()); // separators
        assert!(validate_phone("08123").is_err()); // too short
        assert!(validate_phone("081234567890123456").is_err()); // too long
    }

    #[test]
    fn email_basic_shape() {
        assert!(validate_email("kasir@tokoponsel.co.id").is_ok());
        assert!(validate_email("no-at-sign.example").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn entity_codes() {
        assert!(validate_entity_code("PST").is_ok());
        assert!(validate_entity_code("GDG2").is_ok());
        assert!(validate_entity_code("A").is_err()); // too short
        assert!(validate_entity_code("lowercase").is_err());
        assert!(validate_entity_code("TOOLONGCODE1").is_err());
    }

    #[test]
    fn amounts_must_be_non_negative() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(Decimal::from(100)).is_ok());
        assert!(validate_amount(Decimal::from(-1)).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any uppercase alphanumeric code of valid length passes
        #[test]
        fn well_formed_codes_pass(code in "[A-Z0-9]{2,10}") {
            prop_assert!(validate_entity_code(&code).is_ok());
        }

        /// Any digit string of valid length starting with 0 passes as a
        /// phone number
        #[test]
        fn well_formed_phones_pass(rest in "[0-9]{8,13}") {
            let phone = format!("0{}", rest);
            prop_assert!(validate_phone(&phone).is_ok());
        }

        /// The +62 form accepts exactly what the 0-prefixed form accepts
        #[test]
        fn plus62_matches_local_form(rest in "[0-9]{8,12}") {
            let local = format!("0{}", rest);
            let international = format!("+62{}", rest);
            prop_assert_eq!(
                validate_phone(&local).is_ok(),
                validate_phone(&international).is_ok()
            );
        }
    }
}
