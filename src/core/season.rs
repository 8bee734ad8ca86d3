//! Calendar rules for the planning season.

use chrono::{Datelike, NaiveDate};

/// Solar production is expected to cover the household, so there is no night charging.
#[must_use]
pub fn is_summer(date: NaiveDate) -> bool {
    match date.month() {
        5..=8 => true,
        4 => date.day() >= 10,
        _ => false,
    }
}

/// Solar production is negligible, so the battery may be charged beyond 80%.
#[must_use]
pub fn is_winter(date: NaiveDate) -> bool {
    match date.month() {
        11 | 12 | 1 | 2 => true,
        10 => date.day() >= 10,
        3 => date.day() < 10,
        _ => false,
    }
}
