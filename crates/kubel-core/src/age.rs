//! # Age/Phase Mapper
//!
//! Maps an age in whole months to a phase ordinal (1..=18) using
//! [`AGE_PHASE_TABLE`](crate::primitives::AGE_PHASE_TABLE).
//!
//! Ages are counted in calendar months: a month only counts once its day
//! has been reached. When the birthday falls on a day the target month
//! does not have (e.g. the 31st), the month counts on its last day.
//!
//! A birthday after the reference date is rejected with
//! [`KubelError::FutureBirthday`] when it is entered. Birthdays already
//! stored in a record go through [`stored_birthday_phase`] instead, which
//! never fails: a future birthday counts as age 0 and an unreadable one as
//! no birthday.

use crate::primitives::{AGE_PHASE_TABLE, BIRTHDAY_DATE_FORMAT, TERMINAL_PHASE};
use crate::{KubelError, Phase};
use chrono::{Datelike, Local, Months, NaiveDate};
use indexmap::IndexMap;

/// Phase ordinal for an age in whole months.
#[must_use]
pub fn phase_for_age_in_months(age_in_months: u32) -> u8 {
    AGE_PHASE_TABLE
        .iter()
        .find(|(max_age, _)| age_in_months <= *max_age)
        .map_or(TERMINAL_PHASE, |(_, phase)| *phase)
}

/// The local calendar date.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `DD.MM.YYYY` birthday.
pub fn parse_birthday(birthday: &str) -> Result<NaiveDate, KubelError> {
    NaiveDate::parse_from_str(birthday.trim(), BIRTHDAY_DATE_FORMAT)
        .map_err(|_| KubelError::InvalidBirthday(birthday.to_string()))
}

/// Format a date as `DD.MM.YYYY`.
#[must_use]
pub fn format_birthday(date: NaiveDate) -> String {
    date.format(BIRTHDAY_DATE_FORMAT).to_string()
}

/// Whole calendar months between `birthday` and `today`.
pub fn age_in_months(birthday: NaiveDate, today: NaiveDate) -> Result<u32, KubelError> {
    if birthday > today {
        return Err(KubelError::FutureBirthday(format_birthday(birthday)));
    }

    let year_diff = today.year() - birthday.year();
    let month_diff = today.month() as i32 - birthday.month() as i32;
    let mut months = (year_diff * 12 + month_diff).max(0) as u32;

    // Step back while the anchor (birthday + months, clamped to month end) is after today.
    while months > 0 {
        match birthday.checked_add_months(Months::new(months)) {
            Some(anchor) if anchor <= today => break,
            _ => months -= 1,
        }
    }

    Ok(months)
}

/// Phase ordinal for a `DD.MM.YYYY` birthday as of `today`.
pub fn phase_for_birthday(birthday: &str, today: NaiveDate) -> Result<u8, KubelError> {
    let date = parse_birthday(birthday)?;
    Ok(phase_for_age_in_months(age_in_months(date, today)?))
}

/// Phase of a birthday read from a stored record.
///
/// `None` without a birthday or when it is not `DD.MM.YYYY`. A birthday
/// after `today` maps to the first phase.
#[must_use]
pub fn stored_birthday_phase(birthday: Option<&str>, today: NaiveDate) -> Option<u8> {
    let date = parse_birthday(birthday?).ok()?;
    let months = age_in_months(date, today).unwrap_or(0);
    Some(phase_for_age_in_months(months))
}

/// Phases that apply to a person of the given age.
///
/// Without a usable birthday every phase applies. Otherwise only phases
/// whose id parses as a number not above the current phase are kept;
/// non-numeric ids are dropped.
#[must_use]
pub fn filter_phases_by_age<'a>(
    birthday: Option<&str>,
    phases: &'a IndexMap<String, Phase>,
    today: NaiveDate,
) -> Vec<(&'a str, &'a Phase)> {
    let Some(max_phase) = stored_birthday_phase(birthday, today) else {
        return phases.iter().map(|(id, phase)| (id.as_str(), phase)).collect();
    };

    let max_phase = i64::from(max_phase);
    phases
        .iter()
        .filter(|(id, _)| {
            id.trim()
                .parse::<i64>()
                .is_ok_and(|ordinal| ordinal <= max_phase)
        })
        .map(|(id, phase)| (id.as_str(), phase))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
