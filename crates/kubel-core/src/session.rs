//! # Evaluation Session
//!
//! Explicit state container for editing one person against the category
//! definitions. A session is opened from a stored record, reconciled on
//! open, mutated only through its methods and handed back with
//! [`EvaluationSession::into_person`] for saving.
//!
//! Mutations return outcomes instead of emitting notifications; the caller
//! decides how to present them.

use crate::age::{phase_for_birthday, stored_birthday_phase};
use crate::chart::{ChartPoint, chart_points};
use crate::completion::{SelectionOutcome, select_entry};
use crate::primitives::{DEFAULT_BASELINE, MAX_MIN_VALUE, MAX_NOTE_LENGTH};
use crate::reconcile::{SyncReport, sync_person_with_category_definition};
use crate::report::{PrintOptions, Report};
use crate::scoring::{calculate_result, round_for_display, unknown_count};
use crate::{CategoryData, DisplaySettings, KubelError, Person, Selection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result line of one phase in the evaluation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    pub id: String,
    pub name: String,
    pub result: f64,
    pub unknown: usize,
    /// Highlighted as the phase matching the person's age.
    pub is_current: bool,
}

/// One person being evaluated.
#[derive(Debug, Clone)]
pub struct EvaluationSession<'a> {
    person: Person,
    schema: &'a CategoryData,
    sync: SyncReport,
}

impl<'a> EvaluationSession<'a> {
    /// Open a session, reconciling the person with the definitions.
    pub fn open(mut person: Person, schema: &'a CategoryData) -> Self {
        let sync = sync_person_with_category_definition(&mut person, schema);
        Self {
            person,
            schema,
            sync,
        }
    }

    #[must_use]
    pub fn person(&self) -> &Person {
        &self.person
    }

    #[must_use]
    pub fn schema(&self) -> &CategoryData {
        self.schema
    }

    /// What reconciliation changed when the session was opened.
    #[must_use]
    pub fn sync_report(&self) -> SyncReport {
        self.sync
    }

    /// Hand the edited record back.
    #[must_use]
    pub fn into_person(self) -> Person {
        self.person
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    /// Click `selection` on one entry (toggle, then cascade).
    pub fn select(
        &mut self,
        category_id: &str,
        phase_id: &str,
        entry_index: usize,
        selection: Selection,
    ) -> Result<SelectionOutcome, KubelError> {
        let definition = self
            .schema
            .get(category_id)
            .ok_or_else(|| KubelError::CategoryNotFound(category_id.to_string()))?;
        let category = self
            .person
            .categories
            .get_mut(category_id)
            .ok_or_else(|| KubelError::CategoryNotFound(category_id.to_string()))?;

        let order = definition.phase_ids();
        select_entry(category_id, category, &order, phase_id, entry_index, selection)
    }

    /// Set the birthday (`DD.MM.YYYY`).
    ///
    /// Existing display settings get a new baseline: the phase of the new
    /// birthday when one was set before, the default baseline otherwise.
    pub fn set_birthday(&mut self, birthday: &str, today: NaiveDate) -> Result<(), KubelError> {
        let birthday = birthday.trim();
        let phase = phase_for_birthday(birthday, today)?;

        let had_birthday = self.person.birthday.is_some();
        if let Some(settings) = self.person.display_settings.as_mut() {
            settings.baseline = if had_birthday {
                f64::from(phase)
            } else {
                DEFAULT_BASELINE
            };
        }
        self.person.birthday = Some(birthday.to_string());
        Ok(())
    }

    pub fn clear_birthday(&mut self) {
        self.person.birthday = None;
    }

    /// Replace the note; an empty note removes it.
    pub fn set_note(&mut self, note: &str) -> Result<(), KubelError> {
        if note.len() > MAX_NOTE_LENGTH {
            return Err(KubelError::NoteTooLong(note.len(), MAX_NOTE_LENGTH));
        }
        self.person.note = if note.is_empty() {
            None
        } else {
            Some(note.to_string())
        };
        Ok(())
    }

    /// Chart baseline, any finite value `>= 0`.
    pub fn set_baseline(&mut self, baseline: f64) -> Result<(), KubelError> {
        if !baseline.is_finite() || baseline < 0.0 {
            return Err(KubelError::OutOfRange {
                field: "baseline",
                value: baseline,
                min: 0.0,
                max: f64::MAX,
            });
        }
        self.settings_mut().baseline = baseline;
        Ok(())
    }

    /// Chart minimum value, `0..=18`.
    pub fn set_min_value(&mut self, min_value: f64) -> Result<(), KubelError> {
        if !(0.0..=MAX_MIN_VALUE).contains(&min_value) {
            return Err(KubelError::OutOfRange {
                field: "minValue",
                value: min_value,
                min: 0.0,
                max: MAX_MIN_VALUE,
            });
        }
        self.settings_mut().min_value = min_value;
        Ok(())
    }

    fn settings_mut(&mut self) -> &mut DisplaySettings {
        self.person
            .display_settings
            .get_or_insert_with(DisplaySettings::default)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Phase matching the person's age, `None` without a readable birthday.
    /// A stored birthday after `today` counts as phase 1.
    #[must_use]
    pub fn current_phase(&self, today: NaiveDate) -> Option<u8> {
        stored_birthday_phase(self.person.birthday.as_deref(), today)
    }

    /// Results of every phase of one category, in definition order.
    pub fn phase_summaries(
        &self,
        category_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<PhaseSummary>, KubelError> {
        let definition = self
            .schema
            .get(category_id)
            .ok_or_else(|| KubelError::CategoryNotFound(category_id.to_string()))?;
        let category = self
            .person
            .categories
            .get(category_id)
            .ok_or_else(|| KubelError::CategoryNotFound(category_id.to_string()))?;
        let current = self.current_phase(today).map(|phase| phase.to_string());

        Ok(definition
            .phases
            .iter()
            .filter_map(|(id, phase_definition)| {
                let phase = category.phases.get(id)?;
                Some(PhaseSummary {
                    id: id.clone(),
                    name: phase_definition.display_name(id).to_string(),
                    result: round_for_display(calculate_result(phase)),
                    unknown: unknown_count(phase),
                    is_current: current.as_deref() == Some(id.trim()),
                })
            })
            .collect())
    }

    pub fn chart(&self, today: NaiveDate) -> Result<Vec<ChartPoint>, KubelError> {
        chart_points(&self.person, self.schema, today)
    }

    /// Report with the default print options for this person.
    pub fn report(&self, today: NaiveDate) -> Result<Report, KubelError> {
        let options = PrintOptions::for_person(&self.person, self.schema, today);
        Report::build(&self.person, self.schema, &options, today)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::empty_person;
    use crate::{Category, CategoryDefinition, EntryDefinition, Phase, PhaseDefinition};
    use Selection::{Do, Dont, Unset};
    use chrono::{DateTime, Utc};

    fn schema() -> CategoryData {
        let phase = |n: usize| PhaseDefinition {
            name: None,
            entries: (0..n).map(|i| EntryDefinition::new(format!("e{i}"))).collect(),
        };
        let mut schema = CategoryData::new();
        schema.insert(
            "cat1".to_string(),
            CategoryDefinition {
                name: "Motor".to_string(),
                phases: [("1", 2), ("2", 4), ("3", 1)]
                    .iter()
                    .map(|(id, n)| ((*id).to_string(), phase(*n)))
                    .collect(),
            },
        );
        schema
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).expect("timestamp")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn open_reconciles_the_record() {
        let schema = schema();
        let mut person = empty_person("Mia", &schema, now());
        person.categories.insert("legacy".to_string(), Category::default());
        person.categories["cat1"].phases["1"] = Phase::with_entries(vec![Do]);

        let session = EvaluationSession::open(person, &schema);

        assert_eq!(session.sync_report().categories_removed, 1);
        assert_eq!(session.sync_report().entries_added, 1);
        assert_eq!(session.person().categories["cat1"].phases["1"].entries, vec![Do, Unset]);
    }

    #[test]
    fn select_cascades_to_previous_phases() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        session.select("cat1", "1", 1, Dont).expect("select");

        for index in 0..4 {
            session.select("cat1", "2", index, Do).expect("select");
        }

        let person = session.into_person();
        assert_eq!(person.categories["cat1"].phases["1"].entries, vec![Do, Do]);
    }

    #[test]
    fn select_unknown_category_fails() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        assert!(matches!(
            session.select("nope", "1", 0, Do),
            Err(KubelError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn birthday_moves_existing_baseline() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);

        session.set_birthday("01.01.2024", day(2024, 5, 1)).expect("birthday");
        assert!(session.person().display_settings.is_none());

        session.set_baseline(10.0).expect("baseline");
        session.set_birthday("01.01.2023", day(2024, 5, 1)).expect("birthday");
        // 16 months -> phase 5
        assert_eq!(session.person().display_settings.map(|s| s.baseline), Some(5.0));
        assert_eq!(session.current_phase(day(2024, 5, 1)), Some(5));

        session.clear_birthday();
        assert_eq!(session.current_phase(day(2024, 5, 1)), None);
    }

    #[test]
    fn first_birthday_resets_baseline_to_default() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);

        session.set_baseline(3.0).expect("baseline");
        session.set_birthday("01.01.2023", day(2024, 5, 1)).expect("birthday");
        assert_eq!(
            session.person().display_settings.map(|s| s.baseline),
            Some(DEFAULT_BASELINE)
        );

        session.set_birthday("01.01.2024", day(2024, 5, 1)).expect("birthday");
        // 4 months -> phase 2
        assert_eq!(session.person().display_settings.map(|s| s.baseline), Some(2.0));
    }

    #[test]
    fn baseline_must_be_non_negative() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        assert!(matches!(
            session.set_baseline(-0.5),
            Err(KubelError::OutOfRange { min, .. }) if min == 0.0
        ));
        assert!(session.set_baseline(f64::NAN).is_err());
        assert!(session.person().display_settings.is_none());

        session.set_baseline(0.0).expect("baseline");
        assert_eq!(session.person().display_settings.map(|s| s.baseline), Some(0.0));
    }

    #[test]
    fn invalid_birthdays_leave_record_untouched() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        assert!(session.set_birthday("2024-01-01", day(2024, 5, 1)).is_err());
        assert!(matches!(
            session.set_birthday("01.01.2030", day(2024, 5, 1)),
            Err(KubelError::FutureBirthday(_))
        ));
        assert!(session.person().birthday.is_none());
    }

    #[test]
    fn min_value_is_bounded() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        assert!(session.set_min_value(19.0).is_err());
        assert!(session.set_min_value(-1.0).is_err());
        session.set_min_value(0.0).expect("min value");
        let settings = session.person().display_settings.expect("settings");
        assert_eq!(settings.min_value, 0.0);
        assert_eq!(settings.baseline, 15.0);
    }

    #[test]
    fn note_is_set_and_cleared() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        session.set_note("climbs stairs").expect("note");
        assert_eq!(session.person().note.as_deref(), Some("climbs stairs"));
        session.set_note("").expect("note");
        assert!(session.person().note.is_none());
        assert!(matches!(
            session.set_note(&"x".repeat(MAX_NOTE_LENGTH + 1)),
            Err(KubelError::NoteTooLong(..))
        ));
    }

    #[test]
    fn summaries_highlight_current_phase() {
        let schema = schema();
        let mut session = EvaluationSession::open(empty_person("Mia", &schema, now()), &schema);
        session.set_birthday("01.01.2024", day(2024, 5, 1)).expect("birthday");
        session.select("cat1", "2", 0, Do).expect("select");

        let summaries = session.phase_summaries("cat1", day(2024, 5, 1)).expect("summaries");
        assert_eq!(summaries.len(), 3);
        assert!(summaries[1].is_current);
        assert!(!summaries[0].is_current);
        assert_eq!(summaries[1].result, 1.0);

        let chart = session.chart(day(2024, 5, 1)).expect("chart");
        assert_eq!(chart[0].result, 7.0);

        let report = session.report(day(2024, 5, 1)).expect("report");
        assert_eq!(report.person_name, "Mia");
    }

    #[test]
    fn views_tolerate_stored_future_birthday() {
        let schema = schema();
        let mut person = empty_person("Mia", &schema, now());
        person.birthday = Some("01.06.2024".to_string());
        let session = EvaluationSession::open(person, &schema);
        let today = day(2024, 5, 1);

        assert_eq!(session.current_phase(today), Some(1));
        let summaries = session.phase_summaries("cat1", today).expect("summaries");
        assert!(summaries[0].is_current);
        assert_eq!(session.chart(today).expect("chart").len(), 1);
        let report = session.report(today).expect("report");
        assert_eq!(report.person_name, "Mia");
    }

    #[test]
    fn views_treat_unreadable_birthday_as_missing() {
        let schema = schema();
        let mut person = empty_person("Mia", &schema, now());
        person.birthday = Some("2024-01-01".to_string());
        let mut session = EvaluationSession::open(person, &schema);
        session.select("cat1", "3", 0, Do).expect("select");
        let today = day(2024, 5, 1);

        assert_eq!(session.current_phase(today), None);
        let summaries = session.phase_summaries("cat1", today).expect("summaries");
        assert!(summaries.iter().all(|summary| !summary.is_current));
        let chart = session.chart(today).expect("chart");
        session.report(today).expect("report");

        session.clear_birthday();
        assert_eq!(session.chart(today).expect("chart"), chart);
    }
}
