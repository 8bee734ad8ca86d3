//! Detection of the meaningful solar production window in a forecast.

use chrono::{DateTime, Local, TimeDelta};

use crate::quantity::power::Kilowatts;

/// Production crossing this level opens or closes the window.
const MID_THRESHOLD: Kilowatts = Kilowatts(0.15);

/// Production is already well under way when the window opens above this level.
const HIGH_THRESHOLD: Kilowatts = Kilowatts(0.2);

/// Production has already been fading when the window closes below this level.
const LOW_THRESHOLD: Kilowatts = Kilowatts(0.1);

const BACK_DATE: TimeDelta = TimeDelta::minutes(30);

#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SolarWindow {
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
}

impl SolarWindow {
    /// Scan the chronological forecast samples.
    pub fn detect(samples: impl IntoIterator<Item = (DateTime<Local>, Kilowatts)>) -> Self {
        let mut window = Self::default();
        for (time, power) in samples {
            match window.start {
                None if power >= MID_THRESHOLD => {
                    window.start =
                        Some(if power >= HIGH_THRESHOLD { time - BACK_DATE } else { time });
                }
                Some(_) if power < MID_THRESHOLD => {
                    window.end = Some(if power < LOW_THRESHOLD { time - BACK_DATE } else { time });
                    break;
                }
                _ => {}
            }
        }
        window
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 21, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_back_dated_window() {
        let window = SolarWindow::detect([
            (at(9, 0), Kilowatts(0.05)),
            (at(10, 0), Kilowatts(0.2)),
            (at(12, 0), Kilowatts(3.0)),
            (at(16, 0), Kilowatts(0.05)),
            (at(17, 0), Kilowatts(0.5)),
        ]);
        assert_eq!(window.start, Some(at(9, 30)));
        assert_eq!(window.end, Some(at(15, 30)));
    }

    #[test]
    fn test_window_without_back_dating() {
        let window = SolarWindow::detect([
            (at(8, 0), Kilowatts(0.17)),
            (at(12, 0), Kilowatts(2.0)),
            (at(18, 0), Kilowatts(0.12)),
        ]);
        assert_eq!(window.start, Some(at(8, 0)));
        assert_eq!(window.end, Some(at(18, 0)));
    }

    #[test]
    fn test_open_window() {
        let window = SolarWindow::detect([(at(8, 0), Kilowatts(0.05)), (at(9, 0), Kilowatts(1.0))]);
        assert_eq!(window.start, Some(at(8, 30)));
        assert_eq!(window.end, None);
    }

    #[test]
    fn test_no_window() {
        let window = SolarWindow::detect([(at(8, 0), Kilowatts(0.1)), (at(9, 0), Kilowatts(0.14))]);
        assert_eq!(window, SolarWindow::default());
        assert_eq!(SolarWindow::detect([]), SolarWindow::default());
    }
}
