//! # Printable Report
//!
//! Builds the content of the print/export view: the selected phases of each
//! enabled category with one mark per entry, the chart, the note and a
//! signature line. Page layout and PDF rendering belong to the presentation
//! layer; `Report::render_text` gives a plain-text rendition for the CLI.
//!
//! ## Print range
//!
//! Each category prints the phases whose numeric id lies in `min..=max`.
//! The default range centres on the person's current phase:
//! `[max(lo, p - 1), max(min(hi, p + 1), lo + 1)]` where `lo`/`hi` are the
//! smallest/largest numeric phase ids. Without a birthday the full id range
//! is used.

use crate::age::{format_birthday, stored_birthday_phase};
use crate::chart::{ChartPoint, chart_points};
use crate::primitives::DEFAULT_PRINT_RANGE;
use crate::scoring::{calculate_result, round_for_display, unknown_count};
use crate::{CategoryData, KubelError, Person, Selection};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// =============================================================================
// TABLE SCALING
// =============================================================================

/// Sizing of the checkbox tables for a given number of tables per row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScaling {
    pub font_size_em: f64,
    pub cell_size_px: u32,
    pub cross_size_px: u32,
    pub cross_offset_px: u32,
}

/// Scaling for 1..=4 tables per row.
#[must_use]
pub fn table_scaling(tables_per_row: u8) -> Option<TableScaling> {
    let (font_size_em, cell_size_px, cross_size_px) = match tables_per_row {
        1 => (1.2, 60, 60),
        2 => (1.0, 50, 50),
        3 => (0.8, 35, 35),
        4 => (0.6, 25, 20),
        _ => return None,
    };
    Some(TableScaling {
        font_size_em,
        cell_size_px,
        cross_size_px,
        cross_offset_px: 0,
    })
}

// =============================================================================
// PRINT OPTIONS
// =============================================================================

/// Print settings of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrintOption {
    pub enabled: bool,
    pub min: i64,
    pub max: i64,
}

impl CategoryPrintOption {
    /// Whether a phase id falls in the printed range.
    #[must_use]
    pub fn includes(&self, phase_id: &str) -> bool {
        phase_id
            .trim()
            .parse::<i64>()
            .is_ok_and(|ordinal| self.min <= ordinal && ordinal <= self.max)
    }
}

/// Settings of the print view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    pub show_graph: bool,
    pub show_notes: bool,
    pub show_signature: bool,
    pub tables_per_row: u8,
    #[serde(default)]
    pub categories: IndexMap<String, CategoryPrintOption>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            show_graph: true,
            show_notes: true,
            show_signature: true,
            tables_per_row: 2,
            categories: IndexMap::new(),
        }
    }
}

impl PrintOptions {
    /// Defaults for a person: every category enabled with its default range.
    #[must_use]
    pub fn for_person(person: &Person, schema: &CategoryData, today: NaiveDate) -> Self {
        let current = stored_birthday_phase(person.birthday.as_deref(), today);

        let categories = schema
            .iter()
            .map(|(id, definition)| {
                let (min, max) = default_print_range(current, definition.phases.keys());
                (
                    id.clone(),
                    CategoryPrintOption {
                        enabled: true,
                        min,
                        max,
                    },
                )
            })
            .collect();

        Self {
            categories,
            ..Self::default()
        }
    }

    /// Change the table density (1..=4).
    pub fn set_tables_per_row(&mut self, tables_per_row: u8) -> Result<(), KubelError> {
        if table_scaling(tables_per_row).is_none() {
            return Err(KubelError::OutOfRange {
                field: "tablesPerRow",
                value: f64::from(tables_per_row),
                min: 1.0,
                max: 4.0,
            });
        }
        self.tables_per_row = tables_per_row;
        Ok(())
    }

    /// Scaling of the current table density, falling back to two per row.
    #[must_use]
    pub fn scaling(&self) -> TableScaling {
        table_scaling(self.tables_per_row)
            .or_else(|| table_scaling(2))
            .unwrap_or(TableScaling {
                font_size_em: 1.0,
                cell_size_px: 50,
                cross_size_px: 50,
                cross_offset_px: 0,
            })
    }
}

/// Default `(min, max)` print range for a category.
pub fn default_print_range<'a>(
    current_phase: Option<u8>,
    phase_ids: impl IntoIterator<Item = &'a String>,
) -> (i64, i64) {
    let ordinals: Vec<i64> = phase_ids
        .into_iter()
        .filter_map(|id| id.trim().parse::<i64>().ok())
        .collect();
    let (Some(&lo), Some(&hi)) = (ordinals.iter().min(), ordinals.iter().max()) else {
        return DEFAULT_PRINT_RANGE;
    };

    match current_phase {
        None => (lo, hi),
        Some(phase) => {
            let phase = i64::from(phase);
            (lo.max(phase - 1), hi.min(phase + 1).max(lo + 1))
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// One printed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
    pub mark: Selection,
}

/// One printed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPhase {
    pub id: String,
    pub name: String,
    pub result: f64,
    pub unknown: usize,
    pub entries: Vec<ReportEntry>,
}

/// One printed category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCategory {
    pub id: String,
    pub name: String,
    pub phases: Vec<ReportPhase>,
}

/// Everything the print view shows for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub person_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    pub generated_on: String,
    pub categories: Vec<ReportCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Vec<ChartPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_date: Option<String>,
    pub scaling: TableScaling,
}

impl Report {
    /// Assemble the report in category definition order.
    pub fn build(
        person: &Person,
        schema: &CategoryData,
        options: &PrintOptions,
        today: NaiveDate,
    ) -> Result<Self, KubelError> {
        let mut categories = Vec::new();

        for (category_id, definition) in schema {
            let Some(option) = options.categories.get(category_id) else {
                continue;
            };
            if !option.enabled {
                continue;
            }
            let Some(category) = person.categories.get(category_id) else {
                continue;
            };

            let phases = definition
                .phases
                .iter()
                .filter(|(phase_id, _)| option.includes(phase_id))
                .filter_map(|(phase_id, phase_definition)| {
                    let phase = category.phases.get(phase_id)?;
                    let entries = phase_definition
                        .entries
                        .iter()
                        .zip(&phase.entries)
                        .map(|(entry, &mark)| ReportEntry {
                            description: entry.description.clone(),
                            additional_information: entry.additional_information.clone(),
                            mark,
                        })
                        .collect();
                    Some(ReportPhase {
                        id: phase_id.clone(),
                        name: phase_definition.display_name(phase_id).to_string(),
                        result: round_for_display(calculate_result(phase)),
                        unknown: unknown_count(phase),
                        entries,
                    })
                })
                .collect();

            categories.push(ReportCategory {
                id: category_id.clone(),
                name: definition.name.clone(),
                phases,
            });
        }

        let chart = if options.show_graph {
            Some(chart_points(person, schema, today)?)
        } else {
            None
        };
        let note = if options.show_notes {
            person.note.clone()
        } else {
            None
        };
        let generated_on = format_birthday(today);
        let signature_date = options.show_signature.then(|| generated_on.clone());

        Ok(Self {
            person_name: person.name.clone(),
            birthday: person.birthday.clone(),
            generated_on,
            categories,
            chart,
            note,
            signature_date,
            scaling: options.scaling(),
        })
    }

    /// Plain-text rendition, one checkbox column per selectable value.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.person_name);
        let _ = writeln!(out, "Generated on {}", self.generated_on);
        if let Some(birthday) = &self.birthday {
            let _ = writeln!(out, "Birthday: {birthday}");
        }

        for category in &self.categories {
            let _ = writeln!(out);
            let _ = writeln!(out, "== {} ==", category.name);
            for phase in &category.phases {
                let _ = writeln!(
                    out,
                    "-- {} {} (result {}, unknown {}) --",
                    category.name, phase.name, phase.result, phase.unknown
                );
                let _ = writeln!(out, "  Do Pa No Un");
                for entry in &phase.entries {
                    let marks: String = Selection::CHOICES
                        .iter()
                        .map(|&choice| if entry.mark == choice { "[x]" } else { "[ ]" })
                        .collect();
                    let _ = writeln!(out, "  {marks} {}", entry.description);
                }
            }
        }

        if let Some(chart) = &self.chart {
            let _ = writeln!(out);
            let _ = writeln!(out, "== Chart ==");
            for point in chart {
                let _ = writeln!(
                    out,
                    "  {:<24} result {:>6}  baseline {:>6}",
                    point.name, point.result, point.baseline
                );
            }
        }

        if let Some(note) = &self.note {
            let _ = writeln!(out);
            let _ = writeln!(out, "== Notes ==");
            let _ = writeln!(out, "{note}");
        }

        if let Some(date) = &self.signature_date {
            let _ = writeln!(out);
            let _ = writeln!(out, "{date}");
            let _ = writeln!(out, "________________________________");
            let _ = writeln!(out, "Signature");
        }

        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
