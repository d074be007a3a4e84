//! # Chart Data
//!
//! One point per category: the summed results of the phases that apply to
//! the person's age, offset by the chart minimum value, next to the
//! user-adjustable baseline.

use crate::age::filter_phases_by_age;
use crate::scoring::{calculate_result, round_for_display};
use crate::{CategoryData, KubelError, Person};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A point of the progress chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub category_id: String,
    pub name: String,
    pub result: f64,
    pub baseline: f64,
}

/// Chart points in the person's category order.
pub fn chart_points(
    person: &Person,
    schema: &CategoryData,
    today: NaiveDate,
) -> Result<Vec<ChartPoint>, KubelError> {
    let settings = person.display_settings_or_default();

    person
        .categories
        .iter()
        .map(|(id, category)| {
            let phases = filter_phases_by_age(person.birthday.as_deref(), &category.phases, today);
            let total: f64 = phases.iter().map(|(_, phase)| calculate_result(phase)).sum();
            let name = schema
                .get(id)
                .map(|definition| definition.name.clone())
                .unwrap_or_else(|| format!("category not found ({id})"));

            Ok(ChartPoint {
                category_id: id.clone(),
                name,
                result: round_for_display(total + settings.min_value),
                baseline: settings.baseline,
            })
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::empty_person;
    use crate::{CategoryDefinition, DisplaySettings, EntryDefinition, PhaseDefinition, Selection};
    use chrono::{DateTime, Utc};

    fn schema() -> CategoryData {
        let phases = ["1", "2", "3"]
            .iter()
            .map(|id| {
                (
                    (*id).to_string(),
                    PhaseDefinition {
                        name: None,
                        entries: vec![EntryDefinition::new("a"), EntryDefinition::new("b")],
                    },
                )
            })
            .collect();
        let mut schema = CategoryData::new();
        schema.insert(
            "motor".to_string(),
            CategoryDefinition {
                name: "Motor".to_string(),
                phases,
            },
        );
        schema
    }

    fn person() -> Person {
        let now = DateTime::<Utc>::from_timestamp(0, 0).expect("timestamp");
        let mut person = empty_person("Mia", &schema(), now);
        let motor = &mut person.categories["motor"];
        motor.phases["1"].entries = vec![Selection::Do, Selection::Do];
        motor.phases["2"].entries = vec![Selection::Do, Selection::Dont];
        motor.phases["3"].entries = vec![Selection::Do, Selection::Do];
        person
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn sums_all_phases_without_birthday() {
        let points = chart_points(&person(), &schema(), day(2024, 1, 1)).expect("chart");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "Motor");
        assert_eq!(points[0].result, 2.5 + 6.0);
        assert_eq!(points[0].baseline, 15.0);
    }

    #[test]
    fn filters_by_age_and_uses_display_settings() {
        let mut person = person();
        person.birthday = Some("01.01.2024".to_string());
        person.display_settings = Some(DisplaySettings {
            baseline: 3.0,
            min_value: 1.0,
        });

        // 4 months -> phase 2: phases 1 and 2 count.
        let points = chart_points(&person, &schema(), day(2024, 5, 1)).expect("chart");
        assert_eq!(points[0].result, 1.5 + 1.0);
        assert_eq!(points[0].baseline, 3.0);
    }

    #[test]
    fn unknown_category_gets_placeholder_name() {
        let mut person = person();
        let motor = person.categories["motor"].clone();
        person.categories.insert("legacy".to_string(), motor);

        let points = chart_points(&person, &schema(), day(2024, 1, 1)).expect("chart");
        assert_eq!(points[1].name, "category not found (legacy)");
    }
}
