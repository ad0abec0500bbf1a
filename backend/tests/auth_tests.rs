//! Role and capability tests
//!
//! Roles are a closed enumeration with static capability sets; every
//! protected operation checks exactly one capability.

use proptest::prelude::*;

use shared::models::{roles_allow, AppRole, Capability};

const ALL_CAPABILITIES: [Capability; 12] = [
    Capability::ManageBranches,
    Capability::ManageUsers,
    Capability::ManageProducts,
    Capability::RecordStockMovements,
    Capability::ViewInventory,
    Capability::Checkout,
    Capability::VoidSales,
    Capability::ManageCashSessions,
    Capability::ManageServiceTickets,
    Capability::ManageCustomers,
    Capability::ManageAccounting,
    Capability::ViewReports,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn owner_can_do_everything() {
        for capability in ALL_CAPABILITIES {
            assert!(
                roles_allow(&[AppRole::Owner], capability),
                "owner should have {:?}",
                capability
            );
        }
    }

    #[test]
    fn only_owner_manages_branches() {
        for role in AppRole::ALL {
            let allowed = roles_allow(&[role], Capability::ManageBranches);
            assert_eq!(allowed, role == AppRole::Owner);
        }
    }

    #[test]
    fn kasir_runs_the_counter_but_not_the_warehouse() {
        let roles = [AppRole::Kasir];
        assert!(roles_allow(&roles, Capability::Checkout));
        assert!(roles_allow(&roles, Capability::ManageCashSessions));
        assert!(roles_allow(&roles, Capability::ManageCustomers));
        assert!(!roles_allow(&roles, Capability::RecordStockMovements));
        assert!(!roles_allow(&roles, Capability::VoidSales));
        assert!(!roles_allow(&roles, Capability::ManageAccounting));
    }

    #[test]
    fn gudang_runs_the_warehouse_but_not_the_counter() {
        let roles = [AppRole::Gudang];
        assert!(roles_allow(&roles, Capability::RecordStockMovements));
        assert!(roles_allow(&roles, Capability::ManageProducts));
        assert!(!roles_allow(&roles, Capability::Checkout));
        assert!(!roles_allow(&roles, Capability::ManageServiceTickets));
    }

    #[test]
    fn teknisi_handles_tickets_only() {
        let roles = [AppRole::Teknisi];
        assert!(roles_allow(&roles, Capability::ManageServiceTickets));
        assert!(roles_allow(&roles, Capability::ViewInventory));
        assert!(!roles_allow(&roles, Capability::Checkout));
        assert!(!roles_allow(&roles, Capability::RecordStockMovements));
    }

    #[test]
    fn capabilities_accumulate_across_roles() {
        let roles = [AppRole::Kasir, AppRole::Gudang];
        assert!(roles_allow(&roles, Capability::Checkout));
        assert!(roles_allow(&roles, Capability::RecordStockMovements));
    }

    #[test]
    fn no_roles_means_no_access() {
        for capability in ALL_CAPABILITIES {
            assert!(!roles_allow(&[], capability));
        }
    }

    #[test]
    fn role_names_round_trip() {
        for role in AppRole::ALL {
            assert_eq!(AppRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(AppRole::from_str("superuser"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = AppRole> {
        prop::sample::select(AppRole::ALL.to_vec())
    }

    fn capability_strategy() -> impl Strategy<Value = Capability> {
        prop::sample::select(ALL_CAPABILITIES.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Adding a role never removes access
        #[test]
        fn roles_are_monotonic(
            base in prop::collection::vec(role_strategy(), 0..3),
            extra in role_strategy(),
            capability in capability_strategy()
        ) {
            let mut extended = base.clone();
            extended.push(extra);
            if roles_allow(&base, capability) {
                prop_assert!(roles_allow(&extended, capability));
            }
        }

        /// Every capability some role grants is also granted to the owner
        #[test]
        fn owner_is_a_superset(role in role_strategy(), capability in capability_strategy()) {
            if roles_allow(&[role], capability) {
                prop_assert!(roles_allow(&[AppRole::Owner], capability));
            }
        }
    }
}
