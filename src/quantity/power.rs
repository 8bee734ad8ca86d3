use std::ops::Mul;

use chrono::TimeDelta;

use crate::quantity::energy::WattHours;

quantity!(Watts, suffix: "W", precision: 0);
quantity!(Kilowatts, suffix: "kW", precision: 3);

impl Mul<TimeDelta> for Watts {
    type Output = WattHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        WattHours(self.0 * rhs.as_seconds_f64() / 3600.0)
    }
}

impl Watts {
    /// Round up to the nearest multiple of the step, the way inverters accept power settings.
    #[must_use]
    pub fn ceil_to(self, step: Self) -> Self {
        Self((self.0 / step.0).ceil() * step.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_mul_time_delta() {
        assert_abs_diff_eq!((Watts(5000.0) * TimeDelta::minutes(15)).0, 1250.0);
    }

    #[test]
    fn test_ceil_to() {
        assert_eq!(Watts(3520.0).ceil_to(Watts(100.0)), Watts(3600.0));
        assert_eq!(Watts(800.0).ceil_to(Watts(100.0)), Watts(800.0));
    }
}
