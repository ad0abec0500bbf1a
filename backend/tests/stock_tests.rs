//! Stock ledger tests
//!
//! Covers movement validation, balance resolution, and the ledger
//! invariants: balances equal the sum of signed movement quantities,
//! transfers conserve total stock, and replayed requests never
//! double-apply.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{movement_deltas, StockMovementType};
use shared::validation::{validate_movement_locations, validate_movement_quantity};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Apply one signed delta to an optional balance the way the ledger does:
/// create-if-absent, reject drops below zero unless overridden
fn apply_delta(
    balance: Option<Decimal>,
    delta: Decimal,
    allow_negative: bool,
) -> Result<Decimal, &'static str> {
    match balance {
        Some(quantity) => {
            let new_quantity = quantity + delta;
            if new_quantity < Decimal::ZERO && !allow_negative {
                return Err("Insufficient stock");
            }
            Ok(new_quantity)
        }
        None => {
            if delta < Decimal::ZERO && !allow_negative {
                return Err("Insufficient stock");
            }
            Ok(delta)
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn loc() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn in_requires_destination() {
        let err = validate_movement_locations(StockMovementType::In, None, None);
        assert!(err.is_err());

        let ok = validate_movement_locations(StockMovementType::In, None, Some(loc()));
        assert!(ok.is_ok());
    }

    #[test]
    fn adjustment_requires_destination() {
        assert!(validate_movement_locations(StockMovementType::Adjustment, None, None).is_err());
        assert!(
            validate_movement_locations(StockMovementType::Adjustment, None, Some(loc())).is_ok()
        );
    }

    #[test]
    fn out_requires_source() {
        assert!(validate_movement_locations(StockMovementType::Out, None, None).is_err());
        assert!(validate_movement_locations(StockMovementType::Out, Some(loc()), None).is_ok());
    }

    #[test]
    fn transfer_requires_both_locations() {
        let a = loc();
        let b = loc();
        assert!(validate_movement_locations(StockMovementType::Transfer, Some(a), None).is_err());
        assert!(validate_movement_locations(StockMovementType::Transfer, None, Some(b)).is_err());
        assert!(
            validate_movement_locations(StockMovementType::Transfer, Some(a), Some(b)).is_ok()
        );
    }

    #[test]
    fn transfer_rejects_same_location() {
        let a = loc();
        assert!(
            validate_movement_locations(StockMovementType::Transfer, Some(a), Some(a)).is_err()
        );
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_movement_quantity(dec("1.0")).is_ok());
        assert!(validate_movement_quantity(Decimal::ZERO).is_err());
        assert!(validate_movement_quantity(dec("-3.0")).is_err());
    }

    #[test]
    fn in_movement_affects_destination_only() {
        let dest = loc();
        let deltas = movement_deltas(StockMovementType::In, None, Some(dest), dec("5")).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].location_id, dest);
        assert_eq!(deltas[0].delta, dec("5"));
    }

    #[test]
    fn out_movement_affects_source_negatively() {
        let src = loc();
        let deltas = movement_deltas(StockMovementType::Out, Some(src), None, dec("3")).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].location_id, src);
        assert_eq!(deltas[0].delta, dec("-3"));
    }

    #[test]
    fn transfer_moves_quantity_between_locations() {
        let src = loc();
        let dest = loc();
        let deltas = movement_deltas(StockMovementType::Transfer, Some(src), Some(dest), dec("7")).unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].location_id, src);
        assert_eq!(deltas[0].delta, dec("-7"));
        assert_eq!(deltas[1].location_id, dest);
        assert_eq!(deltas[1].delta, dec("7"));
    }

    /// IN of q against balance b results in b + q
    #[test]
    fn inbound_increments_existing_balance() {
        let result = apply_delta(Some(dec("10")), dec("4"), false).unwrap();
        assert_eq!(result, dec("14"));
    }

    /// End-to-end example: balance 10, OUT 3, result 7
    #[test]
    fn outbound_decrements_existing_balance() {
        let result = apply_delta(Some(dec("10")), dec("-3"), false).unwrap();
        assert_eq!(result, dec("7"));
    }

    /// OUT of more than on hand fails and mutates nothing
    #[test]
    fn outbound_rejects_insufficient_stock() {
        let balance = Some(dec("2"));
        let result = apply_delta(balance, dec("-5"), false);
        assert!(result.is_err());
        // Caller keeps the original value on failure
        assert_eq!(balance.unwrap(), dec("2"));
    }

    /// End-to-end example: no balance row, IN 5 creates one with quantity 5
    #[test]
    fn inbound_creates_missing_balance() {
        let result = apply_delta(None, dec("5"), false).unwrap();
        assert_eq!(result, dec("5"));
    }

    #[test]
    fn outbound_against_missing_balance_is_insufficient() {
        assert!(apply_delta(None, dec("-1"), false).is_err());
    }

    #[test]
    fn override_permits_negative_balance() {
        let result = apply_delta(Some(dec("2")), dec("-5"), true).unwrap();
        assert_eq!(result, dec("-3"));
    }

    #[test]
    fn transfer_conserves_total() {
        let src = dec("10");
        let dest = dec("4");
        let q = dec("6");

        let new_src = apply_delta(Some(src), -q, false).unwrap();
        let new_dest = apply_delta(Some(dest), q, false).unwrap();

        assert_eq!(new_src, dec("4"));
        assert_eq!(new_dest, dec("10"));
        assert_eq!(new_src + new_dest, src + dest);
    }

    /// Replaying the same idempotency key must not double-apply
    #[test]
    fn replayed_key_applies_once() {
        let mut seen = HashSet::new();
        let mut balance = dec("10");

        let requests = [("key-1", dec("5")), ("key-1", dec("5")), ("key-2", dec("2"))];
        for (key, delta) in requests {
            if seen.insert(key) {
                balance = apply_delta(Some(balance), delta, false).unwrap();
            }
        }

        // 10 + 5 + 2, the replay of key-1 is ignored
        assert_eq!(balance, dec("17"));
    }

    /// Two increments against the same key settle to b + q1 + q2
    #[test]
    fn serialized_increments_accumulate() {
        let mut balance = dec("10");
        balance = apply_delta(Some(balance), dec("3"), false).unwrap();
        balance = apply_delta(Some(balance), dec("4"), false).unwrap();
        assert_eq!(balance, dec("17"));
    }

    #[test]
    fn movement_type_round_trip() {
        for t in [
            StockMovementType::In,
            StockMovementType::Out,
            StockMovementType::Adjustment,
            StockMovementType::Transfer,
        ] {
            assert_eq!(StockMovementType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(StockMovementType::from_str("SIDEWAYS"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 1000.00
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// IN then OUT of the same quantity returns to the start
        #[test]
        fn in_then_out_round_trips(
            start in quantity_strategy(),
            q in quantity_strategy()
        ) {
            let after_in = apply_delta(Some(start), q, false).unwrap();
            let after_out = apply_delta(Some(after_in), -q, false).unwrap();
            prop_assert_eq!(after_out, start);
        }

        /// The balance always equals the sum of signed deltas applied
        #[test]
        fn balance_is_sum_of_signed_deltas(
            deltas in prop::collection::vec(quantity_strategy(), 1..20)
        ) {
            let mut balance = Decimal::ZERO;
            for delta in &deltas {
                balance = apply_delta(Some(balance), *delta, false).unwrap();
            }
            let expected: Decimal = deltas.iter().sum();
            prop_assert_eq!(balance, expected);
        }

        /// Without the override, a balance never drops below zero
        #[test]
        fn no_negative_balance_without_override(
            start in quantity_strategy(),
            q in quantity_strategy()
        ) {
            match apply_delta(Some(start), -q, false) {
                Ok(result) => prop_assert!(result >= Decimal::ZERO),
                Err(_) => prop_assert!(q > start),
            }
        }

        /// Transfers conserve the total across both balances
        #[test]
        fn transfer_conserves_sum(
            src in quantity_strategy(),
            dest in quantity_strategy(),
            q in quantity_strategy()
        ) {
            if q <= src {
                let new_src = apply_delta(Some(src), -q, false).unwrap();
                let new_dest = apply_delta(Some(dest), q, false).unwrap();
                prop_assert_eq!(new_src + new_dest, src + dest);
            }
        }

        /// Concurrent-style interleavings of increments always settle to
        /// the same total regardless of order
        #[test]
        fn increment_order_is_irrelevant(
            mut amounts in prop::collection::vec(quantity_strategy(), 2..10)
        ) {
            let forward: Decimal = {
                let mut balance = Decimal::ZERO;
                for a in &amounts {
                    balance = apply_delta(Some(balance), *a, false).unwrap();
                }
                balance
            };

            amounts.reverse();
            let backward: Decimal = {
                let mut balance = Decimal::ZERO;
                for a in &amounts {
                    balance = apply_delta(Some(balance), *a, false).unwrap();
                }
                balance
            };

            prop_assert_eq!(forward, backward);
        }

        /// Replays keyed by idempotency key never double-apply
        #[test]
        fn idempotent_replay_applies_once(
            entries in prop::collection::vec((0u8..5, quantity_strategy()), 1..30)
        ) {
            let mut seen = HashSet::new();
            let mut balance = Decimal::ZERO;
            let mut unique = HashMap::new();

            for (key, delta) in &entries {
                unique.entry(*key).or_insert(*delta);
                if seen.insert(*key) {
                    balance = apply_delta(Some(balance), *delta, false).unwrap();
                }
            }

            let expected: Decimal = unique.values().copied().sum();
            prop_assert_eq!(balance, expected);
        }

        /// Deltas of a transfer always sum to zero
        #[test]
        fn transfer_deltas_sum_to_zero(q in quantity_strategy()) {
            let src = Uuid::new_v4();
            let dest = Uuid::new_v4();
            let deltas = movement_deltas(StockMovementType::Transfer, Some(src), Some(dest), q).unwrap();
            let sum: Decimal = deltas.iter().map(|d| d.delta).sum();
            prop_assert_eq!(sum, Decimal::ZERO);
        }
    }
}
