use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Exclusive.
    pub end: DateTime<Local>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(self, other: DateTime<Local>) -> bool {
        (self.start <= other) && (other < self.end)
    }

    /// The interval has not begun yet.
    #[must_use]
    pub fn is_after(self, now: DateTime<Local>) -> bool {
        self.start > now
    }

    /// The interval is over.
    #[must_use]
    pub fn is_before(self, now: DateTime<Local>) -> bool {
        self.end <= now
    }
}
