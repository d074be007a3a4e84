//! # Core Type Definitions
//!
//! This module contains all schema types for KuBel:
//! - Category definitions (`CategoryDefinition`, `PhaseDefinition`, `EntryDefinition`)
//! - Evaluation records (`Person`, `Category`, `Phase`, `Selection`)
//! - Persisted containers (`Data`, `Config`)
//! - Error types (`KubelError`)
//!
//! ## Ordering Guarantees
//!
//! Every map in this module is an `IndexMap`. Phase order inside a category
//! definition is semantic (auto-completion cascades follow it), so the
//! order of the JSON source is kept on load and reproduced on save.
//!
//! JSON field names are camelCase to stay compatible with existing files.

use crate::primitives::{DEFAULT_BASELINE, DEFAULT_MIN_VALUE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// SELECTION
// =============================================================================

/// The recorded judgment for one checklist entry.
///
/// Serialized as its integer code (`-1..=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Selection {
    /// Not evaluated yet.
    #[default]
    Unset,
    /// Fully achieved.
    Do,
    /// Partially achieved.
    Partially,
    /// Not achieved.
    Dont,
    /// Could not be judged.
    Unknown,
}

impl Selection {
    /// All values a caregiver can pick, in column order.
    pub const CHOICES: [Selection; 4] = [
        Selection::Do,
        Selection::Partially,
        Selection::Dont,
        Selection::Unknown,
    ];

    /// Integer code used in `data.json`.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Selection::Unset => -1,
            Selection::Do => 0,
            Selection::Partially => 1,
            Selection::Dont => 2,
            Selection::Unknown => 3,
        }
    }

    /// Short lowercase name, also accepted by `FromStr`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Selection::Unset => "unset",
            Selection::Do => "do",
            Selection::Partially => "partially",
            Selection::Dont => "dont",
            Selection::Unknown => "unknown",
        }
    }
}

impl From<Selection> for i8 {
    fn from(selection: Selection) -> Self {
        selection.code()
    }
}

impl TryFrom<i8> for Selection {
    type Error = KubelError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Selection::Unset),
            0 => Ok(Selection::Do),
            1 => Ok(Selection::Partially),
            2 => Ok(Selection::Dont),
            3 => Ok(Selection::Unknown),
            other => Err(KubelError::InvalidSelection(other.to_string())),
        }
    }
}

impl FromStr for Selection {
    type Err = KubelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" | "-1" => Ok(Selection::Unset),
            "do" | "0" => Ok(Selection::Do),
            "partially" | "1" => Ok(Selection::Partially),
            "dont" | "don't" | "2" => Ok(Selection::Dont),
            "unknown" | "3" => Ok(Selection::Unknown),
            _ => Err(KubelError::InvalidSelection(s.to_string())),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CATEGORY DEFINITIONS (read-only content)
// =============================================================================

/// Category definitions keyed by category id, in file order.
pub type CategoryData = IndexMap<String, CategoryDefinition>;

/// One checklist item of a phase definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDefinition {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
}

impl EntryDefinition {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            additional_information: None,
        }
    }
}

/// An age-banded phase of a category definition.
///
/// The length and order of `entries` define the index space of
/// `Phase::entries` in every person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PhaseDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDefinition>,
}

impl PhaseDefinition {
    /// Label for display: the phase name, or its id when unnamed.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => id,
        }
    }
}

/// A named evaluation domain subdivided into phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    pub phases: IndexMap<String, PhaseDefinition>,
}

impl CategoryDefinition {
    /// Phase ids in declared order.
    #[must_use]
    pub fn phase_ids(&self) -> Vec<&str> {
        self.phases.keys().map(String::as_str).collect()
    }
}

// =============================================================================
// EVALUATION RECORDS (mutable state)
// =============================================================================

/// Selections of one phase, index-aligned with `PhaseDefinition::entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Phase {
    #[serde(default)]
    pub entries: Vec<Selection>,
}

impl Phase {
    #[must_use]
    pub fn with_entries(entries: Vec<Selection>) -> Self {
        Self { entries }
    }
}

/// Per-person state of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Category {
    #[serde(default)]
    pub phases: IndexMap<String, Phase>,
}

/// Chart settings stored with a person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub baseline: f64,
    /// Older files only carry `baseline`.
    #[serde(default = "default_min_value")]
    pub min_value: f64,
}

fn default_min_value() -> f64 {
    DEFAULT_MIN_VALUE
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE,
            min_value: DEFAULT_MIN_VALUE,
        }
    }
}

/// The evaluation record of one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    /// `DD.MM.YYYY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    /// ISO-8601 timestamp.
    pub last_changed: String,
    #[serde(default)]
    pub categories: IndexMap<String, Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_settings: Option<DisplaySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Person {
    /// Display settings, falling back to the defaults.
    #[must_use]
    pub fn display_settings_or_default(&self) -> DisplaySettings {
        self.display_settings.unwrap_or_default()
    }
}

/// People keyed by their generated id.
pub type People = IndexMap<String, Person>;

/// Content of `data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub version: String,
    #[serde(default)]
    pub people: People,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Sort key of the people list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonOrder {
    #[default]
    Name,
    Birthday,
}

impl FromStr for PersonOrder {
    type Err = KubelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(PersonOrder::Name),
            "birthday" => Ok(PersonOrder::Birthday),
            other => Err(KubelError::InvalidConfigValue {
                key: "personlist.order",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PersonOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PersonOrder::Name => "name",
            PersonOrder::Birthday => "birthday",
        })
    }
}

/// Sort direction of the people list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for OrderDirection {
    type Err = KubelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(KubelError::InvalidConfigValue {
                key: "personlist.orderdir",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        })
    }
}

/// People list settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonListSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<PersonOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderdir: Option<OrderDirection>,
}

/// Content of `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personlist: Option<PersonListSettings>,
    #[serde(default = "default_true")]
    pub open_pdf_after_save: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            personlist: None,
            open_pdf_after_save: true,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in KuBel.
///
/// Every failure is local to one operation: the caller reports it and the
/// user retries. Nothing here is process-fatal.
#[derive(Debug, Error)]
pub enum KubelError {
    /// A file could not be read or written.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A file or request body could not be parsed.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// No person with this id.
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    /// No category with this id (in the definitions or the person record).
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// No phase with this id inside the category.
    #[error("Phase not found: {category}/{phase}")]
    PhaseNotFound { category: String, phase: String },

    /// Entry index outside the phase.
    #[error("Entry {index} not found in phase {phase}")]
    EntryNotFound { phase: String, index: usize },

    /// A selection code or name that is not part of the enumeration.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Birthday does not match `DD.MM.YYYY`.
    #[error("Invalid birthday '{0}', expected DD.MM.YYYY")]
    InvalidBirthday(String),

    /// Birthday after the reference date.
    #[error("Birthday {0} lies in the future")]
    FutureBirthday(String),

    /// Empty or oversized person name.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Oversized note.
    #[error("Note length {0} exceeds maximum {1} bytes")]
    NoteTooLong(usize, usize),

    /// A config string outside its allowed set.
    #[error("Invalid value '{value}' for {key}")]
    InvalidConfigValue { key: &'static str, value: String },

    /// A numeric setting outside its allowed range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A category definition file without the expected structure.
    #[error("Malformed category definition: {0}")]
    MalformedSchema(String),

    /// The update manifest could not be fetched or understood.
    #[error("Update check failed: {0}")]
    UpdateError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_codes_round_trip() {
        for code in -1i8..=3 {
            let selection = Selection::try_from(code).expect("valid code");
            assert_eq!(selection.code(), code);
        }
        assert!(Selection::try_from(4).is_err());
    }

    #[test]
    fn selection_serializes_as_integer() {
        let phase = Phase::with_entries(vec![Selection::Unset, Selection::Do, Selection::Unknown]);
        let json = serde_json::to_string(&phase).expect("serialize");
        assert_eq!(json, r#"{"entries":[-1,0,3]}"#);
    }

    #[test]
    fn selection_parses_names() {
        assert_eq!("Do".parse::<Selection>().expect("parse"), Selection::Do);
        assert_eq!("dont".parse::<Selection>().expect("parse"), Selection::Dont);
        assert!("maybe".parse::<Selection>().is_err());
    }

    #[test]
    fn person_uses_camel_case_fields() {
        let json = r#"{
            "name": "Mia",
            "birthday": "01.02.2022",
            "lastChanged": "2024-01-01T00:00:00.000Z",
            "displaySettings": { "baseline": 12 },
            "categories": {}
        }"#;
        let person: Person = serde_json::from_str(json).expect("parse");
        assert_eq!(person.birthday.as_deref(), Some("01.02.2022"));
        let settings = person.display_settings.expect("settings");
        assert_eq!(settings.baseline, 12.0);
        assert_eq!(settings.min_value, DEFAULT_MIN_VALUE);

        let out = serde_json::to_string(&person).expect("serialize");
        assert!(out.contains("\"lastChanged\""));
        assert!(out.contains("\"minValue\""));
        assert!(!out.contains("\"note\""));
    }

    #[test]
    fn category_definition_keeps_phase_order() {
        let json = r#"{ "name": "Motor", "phases": {
            "10": { "entries": [] },
            "2": { "entries": [] },
            "7": { "entries": [] }
        } }"#;
        let def: CategoryDefinition = serde_json::from_str(json).expect("parse");
        assert_eq!(def.phase_ids(), vec!["10", "2", "7"]);
    }

    #[test]
    fn config_defaults_open_pdf_after_save() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert!(config.open_pdf_after_save);
        assert!(config.personlist.is_none());

        let config: Config =
            serde_json::from_str(r#"{"personlist":{"order":"birthday","orderdir":"desc"},"openPdfAfterSave":false}"#)
                .expect("parse");
        let list = config.personlist.expect("personlist");
        assert_eq!(list.order, Some(PersonOrder::Birthday));
        assert_eq!(list.orderdir, Some(OrderDirection::Desc));
        assert!(!config.open_pdf_after_save);
    }

    #[test]
    fn order_names_parse_back() {
        for order in [PersonOrder::Name, PersonOrder::Birthday] {
            assert_eq!(order.to_string().parse::<PersonOrder>().expect("parse"), order);
        }
        for direction in [OrderDirection::Asc, OrderDirection::Desc] {
            assert_eq!(
                direction.to_string().parse::<OrderDirection>().expect("parse"),
                direction
            );
        }
    }

    #[test]
    fn phase_display_name_falls_back_to_id() {
        let unnamed = PhaseDefinition::default();
        assert_eq!(unnamed.display_name("3"), "3");
        let named = PhaseDefinition {
            name: Some("Phase 3".to_string()),
            entries: Vec::new(),
        };
        assert_eq!(named.display_name("3"), "Phase 3");
    }
}
