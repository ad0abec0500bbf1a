//! Accounting tests
//!
//! Journal entries must balance before anything is written; posting moves
//! account balances by the debit/credit convention of each account type.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::AccountType;
use shared::validation::validate_journal_lines;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Balance change applied when posting one line to an account
fn posting_change(account_type: AccountType, debit: Decimal, credit: Decimal) -> Decimal {
    if account_type.debit_increases() {
        debit - credit
    } else {
        credit - debit
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn balanced_entry_passes() {
        let lines = [
            (dec("100000"), Decimal::ZERO),
            (Decimal::ZERO, dec("100000")),
        ];
        assert!(validate_journal_lines(&lines).is_ok());
    }

    #[test]
    fn multi_line_balanced_entry_passes() {
        // Sale with COGS: Kas 186000 / Pendapatan 186000,
        // HPP 120000 / Persediaan 120000
        let lines = [
            (dec("186000"), Decimal::ZERO),
            (Decimal::ZERO, dec("186000")),
            (dec("120000"), Decimal::ZERO),
            (Decimal::ZERO, dec("120000")),
        ];
        assert!(validate_journal_lines(&lines).is_ok());
    }

    #[test]
    fn unbalanced_entry_fails() {
        let lines = [(dec("100000"), Decimal::ZERO), (Decimal::ZERO, dec("90000"))];
        assert!(validate_journal_lines(&lines).is_err());
    }

    #[test]
    fn empty_entry_fails() {
        assert!(validate_journal_lines(&[]).is_err());
    }

    #[test]
    fn zero_only_entry_fails() {
        let lines = [(Decimal::ZERO, Decimal::ZERO)];
        assert!(validate_journal_lines(&lines).is_err());
    }

    #[test]
    fn both_sides_on_one_line_fails() {
        let lines = [(dec("50000"), dec("50000"))];
        assert!(validate_journal_lines(&lines).is_err());
    }

    #[test]
    fn negative_amount_fails() {
        let lines = [(dec("-100"), Decimal::ZERO), (Decimal::ZERO, dec("-100"))];
        assert!(validate_journal_lines(&lines).is_err());
    }

    #[test]
    fn debit_normal_accounts() {
        assert!(AccountType::Asset.debit_increases());
        assert!(AccountType::Expense.debit_increases());
        assert!(!AccountType::Liability.debit_increases());
        assert!(!AccountType::Equity.debit_increases());
        assert!(!AccountType::Revenue.debit_increases());
    }

    #[test]
    fn posting_a_sale_moves_balances_by_convention() {
        // Debit Kas (asset) grows, credit Pendapatan (revenue) grows
        assert_eq!(
            posting_change(AccountType::Asset, dec("186000"), Decimal::ZERO),
            dec("186000")
        );
        assert_eq!(
            posting_change(AccountType::Revenue, Decimal::ZERO, dec("186000")),
            dec("186000")
        );
        // Credit Persediaan (asset) shrinks
        assert_eq!(
            posting_change(AccountType::Asset, Decimal::ZERO, dec("120000")),
            dec("-120000")
        );
    }

    #[test]
    fn account_type_round_trip() {
        for t in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Revenue,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(AccountType::from_str("piggybank"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 0))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Mirroring every debit with an equal credit always balances
        #[test]
        fn mirrored_lines_always_balance(
            amounts in prop::collection::vec(amount_strategy(), 1..10)
        ) {
            let mut lines = Vec::new();
            for amount in &amounts {
                lines.push((*amount, Decimal::ZERO));
                lines.push((Decimal::ZERO, *amount));
            }
            prop_assert!(validate_journal_lines(&lines).is_ok());
        }

        /// Perturbing one side of a balanced entry breaks it
        #[test]
        fn perturbed_entry_fails(
            amount in amount_strategy(),
            extra in amount_strategy()
        ) {
            let lines = [
                (amount + extra, Decimal::ZERO),
                (Decimal::ZERO, amount),
            ];
            prop_assert!(validate_journal_lines(&lines).is_err());
        }

        /// Posting a balanced entry leaves the accounting equation intact:
        /// the sum of debit-normal changes equals the sum of credit-normal
        /// changes
        #[test]
        fn posting_preserves_the_equation(
            amounts in prop::collection::vec(amount_strategy(), 1..8)
        ) {
            // Each amount becomes debit Kas (asset) / credit Pendapatan
            // (revenue), a balanced pair
            let mut debit_normal = Decimal::ZERO;
            let mut credit_normal = Decimal::ZERO;
            for amount in &amounts {
                debit_normal += posting_change(AccountType::Asset, *amount, Decimal::ZERO);
                credit_normal += posting_change(AccountType::Revenue, Decimal::ZERO, *amount);
            }
            prop_assert_eq!(debit_normal, credit_normal);
        }
    }
}
