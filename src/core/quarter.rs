use std::ops::Range;

use chrono::{DateTime, Local, TimeDelta};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{core::interval::Interval, quantity::price::Price};

pub const QUARTER: TimeDelta = TimeDelta::minutes(15);

pub const QUARTERS_PER_DAY: usize = 96;

/// Quarter-hour price slot.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarter {
    pub start: DateTime<Local>,
    pub price: Price,
}

impl Quarter {
    pub const fn new(start: DateTime<Local>, price: Price) -> Self {
        Self { start, price }
    }

    #[must_use]
    pub fn end(self) -> DateTime<Local> {
        self.start + QUARTER
    }

    pub fn interval(self) -> Interval {
        Interval::new(self.start, self.end())
    }
}

/// Two consecutive days of quarters, starting today at midnight.
#[must_use]
#[derive(Clone, Debug, derive_more::Deref)]
pub struct QuarterSeries(Vec<Quarter>);

impl QuarterSeries {
    pub const LEN: usize = 2 * QUARTERS_PER_DAY;

    /// From 22:00 today until 06:00 tomorrow.
    pub const NIGHT: Range<usize> = 88..120;

    /// From 06:00 until 22:00 tomorrow.
    pub const DAY: Range<usize> = 120..184;

    /// From 15:00 today until 22:00 tomorrow.
    pub const AFTERNOON_TO_EVENING: Range<usize> = 60..184;

    /// Build the series from today's and tomorrow's quarters.
    ///
    /// Returns [`None`] when either day is incomplete, which means that the prices are not
    /// published yet.
    pub fn try_from_days(today: Vec<Quarter>, tomorrow: Vec<Quarter>) -> Option<Self> {
        if today.len() != QUARTERS_PER_DAY || tomorrow.len() != QUARTERS_PER_DAY {
            return None;
        }
        let quarters = [today, tomorrow].concat();
        quarters
            .iter()
            .tuple_windows()
            .all(|(previous, next)| next.start == previous.end())
            .then_some(Self(quarters))
    }

    #[must_use]
    pub fn night(&self) -> &[Quarter] {
        &self.0[Self::NIGHT]
    }

    #[must_use]
    pub fn day(&self) -> &[Quarter] {
        &self.0[Self::DAY]
    }

    #[must_use]
    pub fn afternoon_to_evening(&self) -> &[Quarter] {
        &self.0[Self::AFTERNOON_TO_EVENING]
    }
}


#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::{fixtures::quarters, *};

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    const TOMORROW: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();

    #[test]
    fn test_try_from_days_ok() {
        let series = QuarterSeries::try_from_days(
            quarters(TODAY, vec![1.0; QUARTERS_PER_DAY]),
            quarters(TOMORROW, vec![2.0; QUARTERS_PER_DAY]),
        )
        .unwrap();
        assert_eq!(series.len(), QuarterSeries::LEN);
        assert_eq!(series.night()[0].start.hour(), 22);
        assert_eq!(series.night().last().unwrap().end().hour(), 6);
        assert_eq!(series.day()[0].start.hour(), 6);
        assert_eq!(series.day().last().unwrap().end().hour(), 22);
        assert_eq!(series.afternoon_to_evening()[0].start.hour(), 15);
    }

    #[test]
    fn test_try_from_days_incomplete() {
        assert!(
            QuarterSeries::try_from_days(
                quarters(TODAY, vec![1.0; QUARTERS_PER_DAY]),
                quarters(TOMORROW, vec![2.0; 95]),
            )
            .is_none()
        );
        assert!(
            QuarterSeries::try_from_days(quarters(TODAY, vec![1.0; QUARTERS_PER_DAY]), Vec::new())
                .is_none()
        );
    }

    #[test]
    fn test_try_from_days_gap() {
        let day_after = TOMORROW.succ_opt().unwrap();
        assert!(
            QuarterSeries::try_from_days(
                quarters(TODAY, vec![1.0; QUARTERS_PER_DAY]),
                quarters(day_after, vec![2.0; QUARTERS_PER_DAY]),
            )
            .is_none()
        );
    }
}
