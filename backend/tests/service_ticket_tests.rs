//! Service ticket tests
//!
//! The status graph is closed: DITERIMA -> DIAGNOSA/PROSES,
//! DIAGNOSA -> MENUNGGU_SPAREPART/PROSES, MENUNGGU_SPAREPART -> PROSES,
//! PROSES -> SELESAI, SELESAI -> DIAMBIL, with BATAL reachable from any
//! active state and DIAMBIL/BATAL terminal.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::ServiceStatus;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const ALL_STATUSES: [ServiceStatus; 7] = [
    ServiceStatus::Diterima,
    ServiceStatus::Diagnosa,
    ServiceStatus::MenungguSparepart,
    ServiceStatus::Proses,
    ServiceStatus::Selesai,
    ServiceStatus::Diambil,
    ServiceStatus::Batal,
];

/// The settlement guard: a pelunasan may not overshoot a known final cost
fn settlement_allowed(final_cost: Decimal, paid: Decimal, amount: Decimal) -> bool {
    final_cost <= Decimal::ZERO || paid + amount <= final_cost
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        let path = [
            ServiceStatus::Diterima,
            ServiceStatus::Diagnosa,
            ServiceStatus::MenungguSparepart,
            ServiceStatus::Proses,
            ServiceStatus::Selesai,
            ServiceStatus::Diambil,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0].as_str(),
                pair[1].as_str()
            );
        }
    }

    #[test]
    fn fast_track_skips_diagnosis() {
        assert!(ServiceStatus::Diterima.can_transition_to(ServiceStatus::Proses));
        assert!(ServiceStatus::Diagnosa.can_transition_to(ServiceStatus::Proses));
    }

    #[test]
    fn cancellation_is_reachable_from_active_states() {
        for status in [
            ServiceStatus::Diterima,
            ServiceStatus::Diagnosa,
            ServiceStatus::MenungguSparepart,
            ServiceStatus::Proses,
        ] {
            assert!(status.can_transition_to(ServiceStatus::Batal));
        }
    }

    #[test]
    fn finished_work_cannot_be_cancelled() {
        assert!(!ServiceStatus::Selesai.can_transition_to(ServiceStatus::Batal));
    }

    #[test]
    fn backward_transitions_are_rejected() {
        assert!(!ServiceStatus::Proses.can_transition_to(ServiceStatus::Diterima));
        assert!(!ServiceStatus::Selesai.can_transition_to(ServiceStatus::Proses));
        assert!(!ServiceStatus::Diagnosa.can_transition_to(ServiceStatus::Diterima));
    }

    #[test]
    fn terminal_states_allow_nothing() {
        for terminal in [ServiceStatus::Diambil, ServiceStatus::Batal] {
            assert!(terminal.is_terminal());
            for next in ALL_STATUSES {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pickup_requires_completion() {
        for status in [
            ServiceStatus::Diterima,
            ServiceStatus::Diagnosa,
            ServiceStatus::MenungguSparepart,
            ServiceStatus::Proses,
        ] {
            assert!(!status.can_transition_to(ServiceStatus::Diambil));
        }
        assert!(ServiceStatus::Selesai.can_transition_to(ServiceStatus::Diambil));
    }

    #[test]
    fn active_states_are_pre_completion() {
        assert!(ServiceStatus::Diterima.is_active());
        assert!(ServiceStatus::Proses.is_active());
        assert!(!ServiceStatus::Selesai.is_active());
        assert!(!ServiceStatus::Diambil.is_active());
        assert!(!ServiceStatus::Batal.is_active());
    }

    #[test]
    fn status_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(ServiceStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ServiceStatus::from_str("HILANG"), None);
    }

    #[test]
    fn settlement_within_final_cost_is_allowed() {
        assert!(settlement_allowed(dec("100"), dec("40"), dec("60")));
    }

    #[test]
    fn settlement_overshoot_is_rejected() {
        assert!(!settlement_allowed(dec("100"), dec("40"), dec("61")));
    }

    #[test]
    fn settlement_without_final_cost_is_unrestricted() {
        // No final cost agreed yet, e.g. a down payment at intake
        assert!(settlement_allowed(Decimal::ZERO, Decimal::ZERO, dec("50")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = ServiceStatus> {
        prop::sample::select(ALL_STATUSES.to_vec())
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 0))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A terminal state is never left, whatever the target
        #[test]
        fn terminal_states_are_absorbing(
            from in status_strategy(),
            to in status_strategy()
        ) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        /// A transition never targets the state it starts from
        #[test]
        fn self_transitions_are_rejected(status in status_strategy()) {
            prop_assert!(!status.can_transition_to(status));
        }

        /// Any walk along allowed transitions ends after a bounded number
        /// of steps; the graph has no cycles
        #[test]
        fn random_walks_terminate(
            choices in prop::collection::vec(0usize..ALL_STATUSES.len(), 0..20)
        ) {
            let mut current = ServiceStatus::Diterima;
            let mut steps = 0;
            for choice in choices {
                let next = ALL_STATUSES[choice];
                if current.can_transition_to(next) {
                    current = next;
                    steps += 1;
                }
            }
            // Longest possible path: DITERIMA -> DIAGNOSA ->
            // MENUNGGU_SPAREPART -> PROSES -> SELESAI -> DIAMBIL
            prop_assert!(steps <= 5);
        }

        /// The settlement guard never lets payments exceed the final cost
        #[test]
        fn settlement_never_overshoots(
            final_cost in amount_strategy(),
            paid in amount_strategy(),
            amount in amount_strategy()
        ) {
            if final_cost > Decimal::ZERO && settlement_allowed(final_cost, paid, amount) {
                prop_assert!(paid + amount <= final_cost);
            }
        }
    }
}
