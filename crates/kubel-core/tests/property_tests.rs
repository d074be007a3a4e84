//! # Property-Based Tests
//!
//! Reconciliation and scoring invariants checked with proptest.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use kubel_core::{
    Category, CategoryData, CategoryDefinition, EntryDefinition, Person, Phase, PhaseDefinition,
    Selection, calculate_result, empty_person, phase_for_age_in_months,
    sync_person_with_category_definition,
};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn selection() -> impl Strategy<Value = Selection> {
    prop_oneof![
        Just(Selection::Unset),
        Just(Selection::Do),
        Just(Selection::Partially),
        Just(Selection::Dont),
        Just(Selection::Unknown),
    ]
}

/// category id -> phase id -> entry count
fn shape() -> impl Strategy<Value = Vec<(String, Vec<(String, usize)>)>> {
    btree_map("[a-d]", btree_map("[1-6]", 0usize..6, 0..5), 0..4).prop_map(|categories| {
        categories
            .into_iter()
            .map(|(id, phases)| (id, phases.into_iter().collect()))
            .collect()
    })
}

fn schema_from(shape: &[(String, Vec<(String, usize)>)]) -> CategoryData {
    shape
        .iter()
        .map(|(id, phases)| {
            (
                id.clone(),
                CategoryDefinition {
                    name: id.to_uppercase(),
                    phases: phases
                        .iter()
                        .map(|(pid, n)| {
                            (
                                pid.clone(),
                                PhaseDefinition {
                                    name: None,
                                    entries: (0..*n)
                                        .map(|i| EntryDefinition::new(format!("entry {i}")))
                                        .collect(),
                                },
                            )
                        })
                        .collect(),
                },
            )
        })
        .collect()
}

/// A person shaped like `shape` with arbitrary selections.
fn person_from(shape: &[(String, Vec<(String, usize)>)], fill: &[Selection]) -> Person {
    let now = DateTime::<Utc>::from_timestamp(0, 0).expect("timestamp");
    let mut person = empty_person("Mia", &CategoryData::new(), now);
    let mut next = fill.iter().copied().cycle();
    for (id, phases) in shape {
        let mut category = Category {
            phases: IndexMap::new(),
        };
        for (pid, n) in phases {
            let entries = (0..*n).map(|_| next.next().unwrap_or_default()).collect();
            category.phases.insert(pid.clone(), Phase::with_entries(entries));
        }
        person.categories.insert(id.clone(), category);
    }
    person
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The result is a mean of weights in [0, 1].
    #[test]
    fn result_is_within_unit_interval(entries in vec(selection(), 0..40)) {
        let result = calculate_result(&Phase::with_entries(entries));
        prop_assert!((0.0..=1.0).contains(&result));
    }

    /// Unset and Unknown entries never change the result.
    #[test]
    fn excluded_entries_do_not_affect_result(
        entries in vec(selection(), 0..20),
        padding in vec(prop_oneof![Just(Selection::Unset), Just(Selection::Unknown)], 0..10)
    ) {
        let base = calculate_result(&Phase::with_entries(entries.clone()));
        let mut padded = entries;
        padded.extend(padding);
        prop_assert_eq!(calculate_result(&Phase::with_entries(padded)), base);
    }

    /// Phase lookup is monotone in age and bounded by 1..=18.
    #[test]
    fn phase_lookup_is_monotone(age in 0u32..300) {
        let phase = phase_for_age_in_months(age);
        prop_assert!((1..=18).contains(&phase));
        prop_assert!(phase_for_age_in_months(age + 1) >= phase);
    }

    /// Reconciled records match the definitions exactly.
    #[test]
    fn reconciled_person_matches_schema(
        old in shape(),
        new in shape(),
        fill in vec(selection(), 1..30)
    ) {
        let schema = schema_from(&new);
        let mut person = person_from(&old, &fill);
        sync_person_with_category_definition(&mut person, &schema);

        prop_assert_eq!(person.categories.len(), schema.len());
        for (id, definition) in &schema {
            let category = &person.categories[id];
            prop_assert_eq!(category.phases.len(), definition.phases.len());
            for (pid, phase_definition) in &definition.phases {
                prop_assert_eq!(
                    category.phases[pid].entries.len(),
                    phase_definition.entries.len()
                );
            }
        }
    }

    /// A second reconciliation changes nothing.
    #[test]
    fn reconciliation_is_idempotent(
        old in shape(),
        new in shape(),
        fill in vec(selection(), 1..30)
    ) {
        let schema = schema_from(&new);
        let mut person = person_from(&old, &fill);
        sync_person_with_category_definition(&mut person, &schema);
        let snapshot = person.clone();

        let report = sync_person_with_category_definition(&mut person, &schema);

        prop_assert!(report.is_unchanged());
        prop_assert_eq!(person, snapshot);
    }

    /// Selections in the overlapping prefix survive reconciliation.
    #[test]
    fn overlapping_selections_are_preserved(
        old in shape(),
        new in shape(),
        fill in vec(selection(), 1..30)
    ) {
        let schema = schema_from(&new);
        let before = person_from(&old, &fill);
        let mut after = before.clone();
        sync_person_with_category_definition(&mut after, &schema);

        for (id, category) in &after.categories {
            let Some(old_category) = before.categories.get(id) else { continue };
            for (pid, phase) in &category.phases {
                let Some(old_phase) = old_category.phases.get(pid) else { continue };
                let overlap = phase.entries.len().min(old_phase.entries.len());
                prop_assert_eq!(&phase.entries[..overlap], &old_phase.entries[..overlap]);
                for entry in &phase.entries[overlap..] {
                    prop_assert_eq!(*entry, Selection::Unset);
                }
            }
        }
    }

    /// Age in months never exceeds the naive month difference.
    #[test]
    fn age_in_months_is_bounded(days_old in 0i64..4000) {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).expect("date");
        let birthday = today - chrono::Duration::days(days_old);
        let months = kubel_core::age_in_months(birthday, today).expect("age");
        prop_assert!(i64::from(months) * 28 <= days_old);
        prop_assert!(i64::from(months + 1) * 31 > days_old);
    }
}
