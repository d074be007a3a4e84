//! # Scoring Engine
//!
//! Computes the normalized result of one phase.
//!
//! | Selection  | Weight   |
//! |------------|----------|
//! | Do         | 1.0      |
//! | Partially  | 0.5      |
//! | Dont       | 0.0      |
//! | Unset      | excluded |
//! | Unknown    | excluded |
//!
//! The result is the plain mean of the included weights, `0.0` when no
//! entry is included. Rounding is a display concern.

use crate::{Phase, Selection};

/// Weight of a selection, `None` when it does not take part in scoring.
#[must_use]
pub const fn weight(selection: Selection) -> Option<f64> {
    match selection {
        Selection::Do => Some(1.0),
        Selection::Partially => Some(0.5),
        Selection::Dont => Some(0.0),
        Selection::Unset | Selection::Unknown => None,
    }
}

/// Mean weight over the scored entries of a phase.
#[must_use]
pub fn calculate_result(phase: &Phase) -> f64 {
    let (sum, count) = phase
        .entries
        .iter()
        .filter_map(|&selection| weight(selection))
        .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Number of entries marked `Unknown`.
#[must_use]
pub fn unknown_count(phase: &Phase) -> usize {
    phase
        .entries
        .iter()
        .filter(|&&selection| selection == Selection::Unknown)
        .count()
}

/// Round to two decimal places for display.
#[must_use]
pub fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// TESTS
// =============================================================================
