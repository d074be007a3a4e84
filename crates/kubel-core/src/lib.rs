//! # kubel-core
//!
//! The evaluation engine of KuBel - THE LOGIC.
//!
//! A caregiver records, per child, one judgment for every checklist entry
//! of a set of age-banded phases grouped into categories. This crate
//! scores those judgments, maps ages to phases, heals person records when
//! the category definitions change and applies the auto-completion rule to
//! edits.
//!
//! ## Architectural Constraints
//!
//! - Category definitions are read-only content, loaded once
//! - Person records are reconciled against them every time they are opened
//! - All state lives in explicit values (`Data`, `EvaluationSession`); no globals
//! - No async, no network, no logging: outcomes are returned to the caller
//! - Storage goes through the [`Gateway`] trait; the app owns file I/O

// =============================================================================
// MODULES
// =============================================================================

pub mod age;
pub mod chart;
pub mod completion;
pub mod gateway;
pub mod primitives;
pub mod reconcile;
pub mod report;
pub mod scoring;
pub mod session;
pub mod store;
pub mod types;
pub mod update;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Category, CategoryData, CategoryDefinition, Config, Data, DisplaySettings, EntryDefinition,
    KubelError, OrderDirection, People, Person, PersonListSettings, PersonOrder, Phase,
    PhaseDefinition, Selection,
};

// =============================================================================
// RE-EXPORTS: Evaluation Engine
// =============================================================================

pub use age::{
    age_in_months, filter_phases_by_age, format_birthday, parse_birthday, phase_for_age_in_months,
    phase_for_birthday, stored_birthday_phase, today,
};
pub use chart::{ChartPoint, chart_points};
pub use completion::{
    CascadeOutcome, PREVIOUS_SET_TO_DO_MESSAGE, SUBSEQUENT_SET_TO_DONT_MESSAGE, SelectionOutcome,
    apply_auto_completion, select_entry,
};
pub use reconcile::{
    SyncReport, empty_category, empty_person, empty_phase, sync_person_with_category_definition,
};
pub use report::{
    CategoryPrintOption, PrintOptions, Report, ReportCategory, ReportEntry, ReportPhase,
    TableScaling, default_print_range, table_scaling,
};
pub use scoring::{calculate_result, round_for_display, unknown_count};
pub use session::{EvaluationSession, PhaseSummary};

// =============================================================================
// RE-EXPORTS: Persistence and Updates
// =============================================================================

pub use gateway::{
    Gateway, MemoryGateway, load_category_data, load_config, load_data, load_json, save_config,
    save_data, save_json,
};
pub use update::{
    CURRENT_VERSION, UpdateEvent, UpdateManifest, UpdateState, compare_versions, is_newer_version,
};
