//! # Reconciliation Engine
//!
//! Aligns a person record with the current category definitions.
//!
//! Category definitions are versioned content: categories, phases and
//! entries get added and removed between releases. Every time a person is
//! opened, the record is healed against the definitions in two passes:
//!
//! 1. **Add/update**: missing categories and phases are materialized with
//!    `Unset` entries; entry arrays are padded with `Unset` or truncated
//!    from the tail. Selections in the overlapping prefix are kept.
//! 2. **Prune**: categories and phases unknown to the definitions are
//!    removed, regardless of their selections.
//!
//! Both passes iterate a snapshot of the key set they mutate. The
//! operation is idempotent.

use crate::{Category, CategoryData, CategoryDefinition, Person, Phase, PhaseDefinition, Selection};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// EMPTY RECORDS
// =============================================================================

/// A phase with one `Unset` entry per definition entry.
#[must_use]
pub fn empty_phase(definition: &PhaseDefinition) -> Phase {
    Phase::with_entries(vec![Selection::Unset; definition.entries.len()])
}

/// A category with every defined phase, all entries `Unset`.
#[must_use]
pub fn empty_category(definition: &CategoryDefinition) -> Category {
    Category {
        phases: definition
            .phases
            .iter()
            .map(|(id, phase)| (id.clone(), empty_phase(phase)))
            .collect(),
    }
}

/// A new person with every defined category, all entries `Unset`.
#[must_use]
pub fn empty_person(name: &str, schema: &CategoryData, now: DateTime<Utc>) -> Person {
    let categories: IndexMap<String, Category> = schema
        .iter()
        .map(|(id, definition)| (id.clone(), empty_category(definition)))
        .collect();

    Person {
        name: name.to_string(),
        birthday: None,
        last_changed: timestamp(now),
        categories,
        display_settings: None,
        note: None,
    }
}

/// ISO-8601 timestamp with millisecond precision (`2024-01-01T12:00:00.000Z`).
#[must_use]
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// SYNC
// =============================================================================

/// What a reconciliation run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub categories_added: usize,
    pub phases_added: usize,
    pub entries_added: usize,
    pub entries_removed: usize,
    pub categories_removed: usize,
    pub phases_removed: usize,
}

impl SyncReport {
    /// True when the record already matched the definitions.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }

    /// Add the counts of another run.
    pub fn merge(&mut self, other: &SyncReport) {
        self.categories_added += other.categories_added;
        self.phases_added += other.phases_added;
        self.entries_added += other.entries_added;
        self.entries_removed += other.entries_removed;
        self.categories_removed += other.categories_removed;
        self.phases_removed += other.phases_removed;
    }
}

/// Reconcile `person` in place against `schema`.
pub fn sync_person_with_category_definition(
    person: &mut Person,
    schema: &CategoryData,
) -> SyncReport {
    let mut report = SyncReport::default();

    // Pass 1: add missing categories/phases, align entry counts.
    for (category_id, definition) in schema {
        let Some(category) = person.categories.get_mut(category_id) else {
            person
                .categories
                .insert(category_id.clone(), empty_category(definition));
            report.categories_added += 1;
            continue;
        };

        for (phase_id, phase_definition) in &definition.phases {
            let Some(phase) = category.phases.get_mut(phase_id) else {
                category
                    .phases
                    .insert(phase_id.clone(), empty_phase(phase_definition));
                report.phases_added += 1;
                continue;
            };

            let expected = phase_definition.entries.len();
            let actual = phase.entries.len();
            if actual < expected {
                phase.entries.resize(expected, Selection::Unset);
                report.entries_added += expected - actual;
            } else if actual > expected {
                phase.entries.truncate(expected);
                report.entries_removed += actual - expected;
            }
        }
    }

    // Pass 2: prune what the definitions no longer know.
    let category_ids: Vec<String> = person.categories.keys().cloned().collect();
    for category_id in category_ids {
        let Some(definition) = schema.get(&category_id) else {
            person.categories.shift_remove(&category_id);
            report.categories_removed += 1;
            continue;
        };

        let Some(category) = person.categories.get_mut(&category_id) else {
            continue;
        };
        let phase_ids: Vec<String> = category.phases.keys().cloned().collect();
        for phase_id in phase_ids {
            if !definition.phases.contains_key(&phase_id) {
                category.phases.shift_remove(&phase_id);
                report.phases_removed += 1;
            }
        }
    }

    report
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryDefinition;
    use Selection::{Do, Dont, Partially, Unknown, Unset};

    fn phase_def(entries: usize) -> PhaseDefinition {
        PhaseDefinition {
            name: None,
            entries: (0..entries)
                .map(|i| EntryDefinition::new(format!("entry {i}")))
                .collect(),
        }
    }

    fn schema(categories: &[(&str, &[(&str, usize)])]) -> CategoryData {
        categories
            .iter()
            .map(|(id, phases)| {
                (
                    (*id).to_string(),
                    CategoryDefinition {
                        name: format!("Category {id}"),
                        phases: phases
                            .iter()
                            .map(|(pid, n)| ((*pid).to_string(), phase_def(*n)))
                            .collect(),
                    },
                )
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
    }

    #[test]
    fn empty_person_materializes_everything_unset() {
        let schema = schema(&[("motor", &[("1", 2), ("2", 3)]), ("speech", &[("1", 1)])]);
        let person = empty_person("Mia", &schema, now());

        assert_eq!(person.name, "Mia");
        assert_eq!(person.last_changed, "2023-11-14T22:13:20.000Z");
        assert_eq!(person.categories.len(), 2);
        let motor = &person.categories["motor"];
        assert_eq!(motor.phases["1"].entries, vec![Unset, Unset]);
        assert_eq!(motor.phases["2"].entries, vec![Unset, Unset, Unset]);
    }

    #[test]
    fn adds_missing_category_and_phase() {
        let old = schema(&[("motor", &[("1", 2)])]);
        let new = schema(&[("motor", &[("1", 2), ("2", 1)]), ("speech", &[("1", 1)])]);
        let mut person = empty_person("Mia", &old, now());

        let report = sync_person_with_category_definition(&mut person, &new);

        assert_eq!(report.categories_added, 1);
        assert_eq!(report.phases_added, 1);
        assert_eq!(person.categories["motor"].phases["2"].entries, vec![Unset]);
        assert_eq!(person.categories["speech"].phases["1"].entries, vec![Unset]);
    }

    #[test]
    fn growing_phase_keeps_selections_and_pads() {
        let mut person = empty_person("Mia", &schema(&[("motor", &[("1", 3)])]), now());
        person.categories["motor"].phases["1"].entries = vec![Do, Partially, Dont];

        let report =
            sync_person_with_category_definition(&mut person, &schema(&[("motor", &[("1", 5)])]));

        assert_eq!(report.entries_added, 2);
        assert_eq!(
            person.categories["motor"].phases["1"].entries,
            vec![Do, Partially, Dont, Unset, Unset]
        );
    }

    #[test]
    fn shrinking_phase_truncates_tail() {
        let mut person = empty_person("Mia", &schema(&[("motor", &[("1", 5)])]), now());
        person.categories["motor"].phases["1"].entries = vec![Do, Partially, Dont, Unknown, Do];

        let report =
            sync_person_with_category_definition(&mut person, &schema(&[("motor", &[("1", 3)])]));

        assert_eq!(report.entries_removed, 2);
        assert_eq!(
            person.categories["motor"].phases["1"].entries,
            vec![Do, Partially, Dont]
        );
    }

    #[test]
    fn prunes_unknown_categories_and_phases() {
        let old = schema(&[("motor", &[("1", 1), ("2", 1)]), ("speech", &[("1", 1)])]);
        let mut person = empty_person("Mia", &old, now());
        person.categories["speech"].phases["1"].entries = vec![Do];

        let report =
            sync_person_with_category_definition(&mut person, &schema(&[("motor", &[("1", 1)])]));

        assert_eq!(report.categories_removed, 1);
        assert_eq!(report.phases_removed, 1);
        assert!(!person.categories.contains_key("speech"));
        assert!(!person.categories["motor"].phases.contains_key("2"));
    }

    #[test]
    fn second_run_changes_nothing() {
        let old = schema(&[("motor", &[("1", 4), ("9", 2)]), ("gone", &[("1", 1)])]);
        let new = schema(&[("motor", &[("1", 2), ("2", 3)]), ("speech", &[("1", 1)])]);
        let mut person = empty_person("Mia", &old, now());

        let first = sync_person_with_category_definition(&mut person, &new);
        assert!(!first.is_unchanged());
        let snapshot = person.clone();

        let second = sync_person_with_category_definition(&mut person, &new);
        assert!(second.is_unchanged());
        assert_eq!(person, snapshot);
    }

    #[test]
    fn report_merge_adds_counts() {
        let mut total = SyncReport {
            phases_added: 1,
            ..SyncReport::default()
        };
        total.merge(&SyncReport {
            phases_added: 2,
            categories_removed: 1,
            ..SyncReport::default()
        });
        assert_eq!(total.phases_added, 3);
        assert_eq!(total.categories_removed, 1);
    }
}
