use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    core::{interval::Interval, quarter::Quarter},
    quantity::{percent::Percent, power::Watts, price::Price},
};

/// Active battery plan, superseded by every planning pass.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub charge: Vec<ChargeWindow>,

    #[serde(default)]
    pub discharge: Vec<DischargeQuarter>,
}

impl Plan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.charge.is_empty() && self.discharge.is_empty()
    }

    /// Check whether the quarter is covered by any of the charge windows.
    #[must_use]
    pub fn is_charging_at(&self, quarter: Quarter) -> bool {
        self.charge
            .iter()
            .any(|window| window.start <= quarter.start && quarter.end() <= window.end)
    }
}

/// Contiguous run of charge quarters.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeWindow {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub target_soc: Percent,
    pub power: Watts,
}

impl ChargeWindow {
    pub const fn interval(self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeQuarter {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,

    /// Unranked quarters discharge unconditionally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl DischargeQuarter {
    pub const fn unranked(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end, price: None }
    }

    pub const fn interval(self) -> Interval {
        Interval::new(self.start, self.end)
    }

    #[must_use]
    pub const fn is_ranked(self) -> bool {
        self.price.is_some()
    }
}

impl From<Quarter> for DischargeQuarter {
    fn from(quarter: Quarter) -> Self {
        Self { start: quarter.start, end: quarter.end(), price: Some(quarter.price) }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn test_is_charging_at() {
        let start = Local.with_ymd_and_hms(2025, 1, 15, 23, 0, 0).unwrap();
        let plan = Plan {
            charge: vec![ChargeWindow {
                start,
                end: start + TimeDelta::hours(1),
                target_soc: Percent(80.0),
                power: Watts(2000.0),
            }],
            discharge: Vec::new(),
        };
        assert!(plan.is_charging_at(Quarter::new(start, Price(1.0))));
        assert!(plan.is_charging_at(Quarter::new(start + TimeDelta::minutes(45), Price(1.0))));
        assert!(!plan.is_charging_at(Quarter::new(start + TimeDelta::hours(1), Price(1.0))));
        assert!(!plan.is_charging_at(Quarter::new(start - TimeDelta::minutes(15), Price(1.0))));
    }

    #[test]
    fn test_deserialize_unranked() -> Result<(), serde_json::Error> {
        let plan: Plan = serde_json::from_str(
            r#"{"discharge": [{"start": "2025-06-22T07:00:00+02:00", "end": "2025-06-22T08:59:00+02:00"}]}"#,
        )?;
        assert!(plan.charge.is_empty());
        assert_eq!(plan.discharge.len(), 1);
        assert!(!plan.discharge[0].is_ranked());
        Ok(())
    }
}
