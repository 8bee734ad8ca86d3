use chrono::{DateTime, Local, TimeDelta};

use crate::{
    core::quarter::QUARTER,
    quantity::energy::{KilowattHours, WattHours},
};

/// Estimate the average household consumption per quarter from the cumulative meter readings.
///
/// Only the first and the last readings matter. Returns zero when the readings span no time.
pub fn average_quarter_energy(readings: &[(DateTime<Local>, KilowattHours)]) -> WattHours {
    let (Some((first_time, first_total)), Some((last_time, last_total))) =
        (readings.first(), readings.last())
    else {
        return WattHours::ZERO;
    };
    let duration = *last_time - *first_time;
    if duration <= TimeDelta::zero() {
        return WattHours::ZERO;
    }
    let consumed = WattHours::from(*last_total - *first_total);
    consumed / duration * QUARTER
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn test_average_quarter_energy() {
        let start = Local.with_ymd_and_hms(2025, 1, 12, 21, 0, 0).unwrap();
        let readings = [
            (start, KilowattHours(1000.0)),
            (start + TimeDelta::hours(24), KilowattHours(1030.0)),
            (start + TimeDelta::hours(72), KilowattHours(1072.0)),
        ];
        // 72 kWh over 72 hours is 1 kW, which is 250 Wh per quarter.
        assert_abs_diff_eq!(average_quarter_energy(&readings).0, 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_readings() {
        let start = Local.with_ymd_and_hms(2025, 1, 12, 21, 0, 0).unwrap();
        assert_eq!(average_quarter_energy(&[]), WattHours::ZERO);
        assert_eq!(average_quarter_energy(&[(start, KilowattHours(5.0))]), WattHours::ZERO);
    }
}
