use std::ops::Div;

use chrono::TimeDelta;

use crate::quantity::power::Watts;

quantity!(WattHours, suffix: "Wh", precision: 0);
quantity!(KilowattHours, suffix: "kWh", precision: 3);

impl From<KilowattHours> for WattHours {
    fn from(kilowatt_hours: KilowattHours) -> Self {
        Self(kilowatt_hours.0 * 1000.0)
    }
}

impl Div<TimeDelta> for WattHours {
    type Output = Watts;

    fn div(self, rhs: TimeDelta) -> Self::Output {
        Watts(self.0 / (rhs.as_seconds_f64() / 3600.0))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_from_kilowatt_hours() {
        assert_abs_diff_eq!(WattHours::from(KilowattHours(1.5)).0, 1500.0);
    }

    #[test]
    fn test_div_time_delta() {
        assert_abs_diff_eq!((WattHours(500.0) / TimeDelta::minutes(15)).0, 2000.0);
    }
}
