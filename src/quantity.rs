#[macro_use]
mod macros;

pub mod energy;
pub mod percent;
pub mod power;
pub mod price;

#[cfg(test)]
mod tests {
    use crate::quantity::{energy::WattHours, percent::Percent, power::Watts};

    #[test]
    fn test_min() {
        assert_eq!(Watts(1.0).min(Watts(2.0)), Watts(1.0));
        assert_eq!(Watts(2.0).min(Watts(1.0)), Watts(1.0));
    }

    #[test]
    fn test_max() {
        assert_eq!(Watts(1.0).max(Watts(2.0)), Watts(2.0));
        assert_eq!(Watts(2.0).max(Watts(1.0)), Watts(2.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Percent(1.0).clamp(Percent(2.0), Percent(3.0)), Percent(2.0));
        assert_eq!(Percent(4.0).clamp(Percent(2.0), Percent(3.0)), Percent(3.0));
        assert_eq!(Percent(2.0).clamp(Percent(1.0), Percent(3.0)), Percent(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(WattHours(1234.4).to_string(), "1234 Wh");
        assert_eq!(format!("{:?}", Percent(42.0)), "42.0%");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(WattHours(1000.0) / WattHours(250.0), 4.0);
    }
}
