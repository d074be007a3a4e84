//! # Auto-Completion Rule
//!
//! Cascades a fully answered phase to its neighbours inside one category:
//!
//! - every entry of the changed phase is `Do` -> every earlier phase is set to `Do`
//! - every entry of the changed phase is `Dont` -> every later phase is set to `Dont`
//!
//! "Earlier" and "later" follow the declared phase order of the category
//! definition. Only `Do`/`Dont` edits trigger the rule, and a phase without
//! entries matches neither condition.

use crate::{Category, KubelError, Selection};
use serde::{Deserialize, Serialize};

/// Notification shown when earlier phases were completed.
pub const PREVIOUS_SET_TO_DO_MESSAGE: &str = "all previous phases were set to Do";

/// Notification shown when later phases were marked as not achieved.
pub const SUBSEQUENT_SET_TO_DONT_MESSAGE: &str = "all subsequent phases were set to Dont";

/// Which cascades actually changed an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeOutcome {
    pub previous_set_to_do: bool,
    pub subsequent_set_to_dont: bool,
}

impl CascadeOutcome {
    /// True when any entry outside the edited phase changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous_set_to_do || self.subsequent_set_to_dont
    }

    /// User-facing notifications for the cascades that fired.
    #[must_use]
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if self.previous_set_to_do {
            messages.push(PREVIOUS_SET_TO_DO_MESSAGE);
        }
        if self.subsequent_set_to_dont {
            messages.push(SUBSEQUENT_SET_TO_DONT_MESSAGE);
        }
        messages
    }
}

/// Result of one selection edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    /// Value before the edit.
    pub previous: Selection,
    /// Value after the edit (toggled back to `Unset` when unchanged).
    pub current: Selection,
    pub cascade: CascadeOutcome,
}

/// Apply the cascade for a `changed_selection` made in `changed_phase_id`.
///
/// Phases listed in `ordered_phase_ids` but missing from `category` are
/// skipped.
pub fn apply_auto_completion<S: AsRef<str>>(
    category: &mut Category,
    ordered_phase_ids: &[S],
    changed_phase_id: &str,
    changed_selection: Selection,
) -> CascadeOutcome {
    let mut outcome = CascadeOutcome::default();
    if !matches!(changed_selection, Selection::Do | Selection::Dont) {
        return outcome;
    }

    let Some(position) = ordered_phase_ids
        .iter()
        .position(|id| id.as_ref() == changed_phase_id)
    else {
        return outcome;
    };
    let Some(changed) = category.phases.get(changed_phase_id) else {
        return outcome;
    };

    let all = |value: Selection| -> bool {
        !changed.entries.is_empty() && changed.entries.iter().all(|&e| e == value)
    };
    let all_do = all(Selection::Do);
    let all_dont = all(Selection::Dont);

    if all_do {
        outcome.previous_set_to_do =
            fill_phases(category, &ordered_phase_ids[..position], Selection::Do);
    }
    if all_dont {
        outcome.subsequent_set_to_dont =
            fill_phases(category, &ordered_phase_ids[position + 1..], Selection::Dont);
    }

    outcome
}

/// Set every entry of the listed phases to `value`; true if any entry changed.
fn fill_phases<S: AsRef<str>>(category: &mut Category, phase_ids: &[S], value: Selection) -> bool {
    let mut changed = false;
    for id in phase_ids {
        if let Some(phase) = category.phases.get_mut(id.as_ref()) {
            for entry in &mut phase.entries {
                if *entry != value {
                    *entry = value;
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Record a click on `selection` for one entry, then run the cascade.
///
/// Clicking the value that is already set reverts the entry to `Unset`.
/// The cascade is triggered by the clicked value and evaluated against the
/// phase as it is after the toggle.
pub fn select_entry<S: AsRef<str>>(
    category_id: &str,
    category: &mut Category,
    ordered_phase_ids: &[S],
    phase_id: &str,
    entry_index: usize,
    selection: Selection,
) -> Result<SelectionOutcome, KubelError> {
    let phase = category
        .phases
        .get_mut(phase_id)
        .ok_or_else(|| KubelError::PhaseNotFound {
            category: category_id.to_string(),
            phase: phase_id.to_string(),
        })?;
    let entry = phase
        .entries
        .get_mut(entry_index)
        .ok_or_else(|| KubelError::EntryNotFound {
            phase: phase_id.to_string(),
            index: entry_index,
        })?;

    let previous = *entry;
    let current = if previous == selection {
        Selection::Unset
    } else {
        selection
    };
    *entry = current;

    let cascade = apply_auto_completion(category, ordered_phase_ids, phase_id, selection);

    Ok(SelectionOutcome {
        previous,
        current,
        cascade,
    })
}

// =============================================================================
// TESTS
// =============================================================================
