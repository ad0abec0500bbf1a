//! POS sales tests
//!
//! Invoice arithmetic, cash payment rules, loyalty points, and the cash
//! session reconciliation.

use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// One cart line: quantity, unit price, line discount
struct CartLine {
    quantity: Decimal,
    unit_price: Decimal,
    discount: Decimal,
}

impl CartLine {
    fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price - self.discount
    }
}

fn invoice_total(lines: &[CartLine], discount: Decimal, tax: Decimal) -> Decimal {
    let subtotal: Decimal = lines.iter().map(|l| l.subtotal()).sum();
    subtotal - discount + tax
}

/// Change due on a cash payment, or None if the payment is short
fn cash_change(total: Decimal, paid: Decimal) -> Option<Decimal> {
    if paid < total {
        None
    } else {
        Some(paid - total)
    }
}

/// Loyalty points for a sale: one point per full step of spend
fn points_for(total: Decimal, points_per_rupiah: u64) -> i64 {
    if points_per_rupiah == 0 {
        return 0;
    }
    (total / Decimal::from(points_per_rupiah))
        .floor()
        .to_i64()
        .unwrap_or(0)
}

/// Cash session close: expected cash and the drawer difference
fn close_session(opening: Decimal, cash_sales: Decimal, counted: Decimal) -> (Decimal, Decimal) {
    let expected = opening + cash_sales;
    (expected, counted - expected)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn line_subtotal_includes_discount() {
        let line = CartLine {
            quantity: dec("2"),
            unit_price: dec("50000"),
            discount: dec("5000"),
        };
        assert_eq!(line.subtotal(), dec("95000"));
    }

    #[test]
    fn invoice_total_applies_discount_and_tax() {
        let lines = vec![
            CartLine {
                quantity: dec("1"),
                unit_price: dec("150000"),
                discount: Decimal::ZERO,
            },
            CartLine {
                quantity: dec("3"),
                unit_price: dec("20000"),
                discount: dec("10000"),
            },
        ];
        // 150000 + 50000 = 200000; -25000 discount +11000 tax
        assert_eq!(
            invoice_total(&lines, dec("25000"), dec("11000")),
            dec("186000")
        );
    }

    #[test]
    fn exact_cash_payment_has_no_change() {
        assert_eq!(cash_change(dec("186000"), dec("186000")), Some(Decimal::ZERO));
    }

    #[test]
    fn overpayment_returns_change() {
        assert_eq!(cash_change(dec("186000"), dec("200000")), Some(dec("14000")));
    }

    #[test]
    fn short_payment_is_rejected() {
        assert_eq!(cash_change(dec("186000"), dec("150000")), None);
    }

    #[test]
    fn points_accrue_per_full_step() {
        assert_eq!(points_for(dec("186000"), 10_000), 18);
        assert_eq!(points_for(dec("9999"), 10_000), 0);
        assert_eq!(points_for(dec("10000"), 10_000), 1);
    }

    #[test]
    fn zero_step_accrues_nothing() {
        assert_eq!(points_for(dec("186000"), 0), 0);
    }

    #[test]
    fn session_close_balances_when_counted_matches() {
        let (expected, difference) = close_session(dec("500000"), dec("1200000"), dec("1700000"));
        assert_eq!(expected, dec("1700000"));
        assert_eq!(difference, Decimal::ZERO);
    }

    #[test]
    fn session_close_reports_shortfall() {
        let (_, difference) = close_session(dec("500000"), dec("1200000"), dec("1650000"));
        assert_eq!(difference, dec("-50000"));
    }

    /// Voiding restores the stock the sale consumed
    #[test]
    fn void_restores_stock() {
        let sold = dec("3");
        let mut on_hand = dec("10");

        on_hand -= sold; // checkout
        assert_eq!(on_hand, dec("7"));

        on_hand += sold; // void
        assert_eq!(on_hand, dec("10"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 0))
    }

    fn qty_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100i64).prop_map(|n| Decimal::new(n, 0))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Change is never negative and pays the invoice exactly
        #[test]
        fn change_is_consistent(total in money_strategy(), extra in money_strategy()) {
            let paid = total + extra;
            let change = cash_change(total, paid).unwrap();
            prop_assert!(change >= Decimal::ZERO);
            prop_assert_eq!(paid - change, total);
        }

        /// A short payment is always rejected
        #[test]
        fn short_payment_always_rejected(total in money_strategy(), shortfall in money_strategy()) {
            if shortfall > Decimal::ZERO && shortfall <= total {
                prop_assert_eq!(cash_change(total, total - shortfall), None);
            }
        }

        /// The invoice total is the sum of line subtotals, shifted by
        /// invoice discount and tax
        #[test]
        fn total_matches_line_sum(
            quantities in prop::collection::vec(qty_strategy(), 1..10),
            price in money_strategy(),
            tax in money_strategy()
        ) {
            let lines: Vec<CartLine> = quantities
                .iter()
                .map(|q| CartLine { quantity: *q, unit_price: price, discount: Decimal::ZERO })
                .collect();
            let expected: Decimal = quantities.iter().map(|q| *q * price).sum();
            prop_assert_eq!(invoice_total(&lines, Decimal::ZERO, tax), expected + tax);
        }

        /// Points never exceed total / step
        #[test]
        fn points_are_bounded(total in money_strategy()) {
            let step = 10_000u64;
            let points = points_for(total, step);
            prop_assert!(points >= 0);
            prop_assert!(Decimal::from(points) * Decimal::from(step) <= total);
            prop_assert!(Decimal::from(points + 1) * Decimal::from(step) > total);
        }

        /// Checkout then void leaves stock unchanged
        #[test]
        fn void_round_trips_stock(start in qty_strategy(), sold in qty_strategy()) {
            if sold <= start {
                let after_sale = start - sold;
                let after_void = after_sale + sold;
                prop_assert_eq!(after_void, start);
            }
        }
    }
}
