//! Document numbering tests
//!
//! Numbers are formatted `TYPE/YYYYMM/NNNN` and sequence independently
//! per (branch, document type, year-month).

use proptest::prelude::*;
use std::collections::HashMap;

/// The formatting rule of generate_document_number
fn format_number(doc_type: &str, year_month: &str, number: u32) -> String {
    format!("{}/{}/{:04}", doc_type, year_month, number)
}

/// In-memory mirror of the document_sequences table
#[derive(Default)]
struct SequenceTable {
    last: HashMap<(String, String, String), u32>,
}

impl SequenceTable {
    fn next(&mut self, branch: &str, doc_type: &str, year_month: &str) -> String {
        let counter = self
            .last
            .entry((
                branch.to_string(),
                doc_type.to_string(),
                year_month.to_string(),
            ))
            .or_insert(0);
        *counter += 1;
        format_number(doc_type, year_month, *counter)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(format_number("STK", "202503", 1), "STK/202503/0001");
        assert_eq!(format_number("INV", "202503", 42), "INV/202503/0042");
        assert_eq!(format_number("SRV", "202512", 9999), "SRV/202512/9999");
    }

    #[test]
    fn padding_stops_at_four_digits() {
        assert_eq!(format_number("JRN", "202503", 12345), "JRN/202503/12345");
    }

    #[test]
    fn sequences_increment_per_type() {
        let mut table = SequenceTable::default();
        assert_eq!(table.next("PST", "STK", "202503"), "STK/202503/0001");
        assert_eq!(table.next("PST", "STK", "202503"), "STK/202503/0002");
        assert_eq!(table.next("PST", "INV", "202503"), "INV/202503/0001");
    }

    #[test]
    fn sequences_reset_each_month() {
        let mut table = SequenceTable::default();
        assert_eq!(table.next("PST", "STK", "202503"), "STK/202503/0001");
        assert_eq!(table.next("PST", "STK", "202504"), "STK/202504/0001");
        assert_eq!(table.next("PST", "STK", "202503"), "STK/202503/0002");
    }

    #[test]
    fn branches_sequence_independently() {
        let mut table = SequenceTable::default();
        assert_eq!(table.next("PST", "STK", "202503"), "STK/202503/0001");
        assert_eq!(table.next("CBG", "STK", "202503"), "STK/202503/0001");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn doc_type_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["STK", "INV", "SRV", "JRN"])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Numbers issued within one scope are unique and dense
        #[test]
        fn issued_numbers_are_unique(
            count in 1usize..200,
            doc_type in doc_type_strategy()
        ) {
            let mut table = SequenceTable::default();
            let mut seen = std::collections::HashSet::new();
            for _ in 0..count {
                let number = table.next("PST", doc_type, "202503");
                prop_assert!(seen.insert(number));
            }
            prop_assert_eq!(seen.len(), count);
        }

        /// Interleaving scopes never bleeds counters across them
        #[test]
        fn scopes_are_isolated(
            requests in prop::collection::vec(
                (prop::sample::select(vec!["PST", "CBG"]), doc_type_strategy()),
                1..100
            )
        ) {
            let mut table = SequenceTable::default();
            let mut per_scope: HashMap<(String, String), u32> = HashMap::new();

            for (branch, doc_type) in requests {
                let number = table.next(branch, doc_type, "202503");
                let counter = per_scope
                    .entry((branch.to_string(), doc_type.to_string()))
                    .or_insert(0);
                *counter += 1;
                prop_assert_eq!(number, format_number(doc_type, "202503", *counter));
            }
        }
    }
}
