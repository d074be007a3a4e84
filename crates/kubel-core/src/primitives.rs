//! # Fixed Primitives
//!
//! Hardcoded constants for the KuBel core.
//!
//! The category definitions change with the content file, but the age
//! table, display defaults and file layout are compiled into the binary
//! and are immutable at runtime.

/// Age table: (maximum age in months, inclusive) -> phase ordinal.
///
/// Ascending by age. The first row whose age threshold is >= the input
/// age determines the phase.
pub const AGE_PHASE_TABLE: [(u32, u8); 18] = [
    (2, 1),
    (5, 2),
    (8, 3),
    (11, 4),
    (17, 5),
    (23, 6),
    (29, 7),
    (35, 8),
    (41, 9),
    (47, 10),
    (53, 11),
    (59, 12),
    (65, 13),
    (71, 14),
    (84, 15),
    (97, 16),
    (110, 17),
    (123, 18),
];

/// Phase returned for ages beyond the last table row.
pub const TERMINAL_PHASE: u8 = 18;

/// chrono format of a stored birthday (`DD.MM.YYYY`).
pub const BIRTHDAY_DATE_FORMAT: &str = "%d.%m.%Y";

// =============================================================================
// DISPLAY DEFAULTS
// =============================================================================

/// Baseline shown on the chart when a person has no display settings.
pub const DEFAULT_BASELINE: f64 = 15.0;

/// Offset added to every chart result when a person has no display settings.
pub const DEFAULT_MIN_VALUE: f64 = 6.0;

/// Upper bound accepted for the chart minimum value.
pub const MAX_MIN_VALUE: f64 = 18.0;

/// Print range used when a category has no numeric phase ids.
pub const DEFAULT_PRINT_RANGE: (i64, i64) = (7, 18);

// =============================================================================
// PERSISTENCE LAYOUT
// =============================================================================

/// People store.
pub const DATA_FILE: &str = "data.json";

/// Category definitions (read-only content).
pub const CATEGORIES_FILE: &str = "categories.json";

/// User settings.
pub const CONFIG_FILE: &str = "config.json";

/// Version written into a freshly created `data.json`.
pub const DATA_FORMAT_VERSION: &str = "1.0.0";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a person name in bytes.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of a person note in bytes (64KB).
pub const MAX_NOTE_LENGTH: usize = 65536;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_table_is_ascending() {
        for pair in AGE_PHASE_TABLE.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert_eq!(pair[0].1 + 1, pair[1].1);
        }
    }

    #[test]
    fn terminal_phase_is_last_row() {
        assert_eq!(AGE_PHASE_TABLE[AGE_PHASE_TABLE.len() - 1].1, TERMINAL_PHASE);
    }
}
