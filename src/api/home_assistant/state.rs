use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_with::serde_as;

use crate::quantity::power::Kilowatts;

/// Response of `/api/states/{entity_id}`.
#[must_use]
#[derive(Deserialize)]
pub struct EntityState<A = serde::de::IgnoredAny> {
    pub state: String,

    pub attributes: A,
}

impl<A> EntityState<A> {
    /// Home Assistant reports these when the source entity is offline or was never set.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self.state.as_str(), "unavailable" | "unknown" | "")
    }
}

/// Attributes of the solar production forecast sensor.
#[must_use]
#[serde_as]
#[derive(Deserialize)]
pub struct ForecastAttributes {
    #[serde_as(as = "serde_with::VecSkipError<_>")]
    pub power: Vec<ForecastSample>,
}

#[must_use]
#[derive(Copy, Clone, Deserialize)]
pub struct ForecastSample {
    pub time: DateTime<Local>,

    #[serde(rename = "value")]
    pub power: Kilowatts,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_deserialize_state_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "entity_id": "sensor.battery_level",
                "state": "57.3",
                "attributes": {
                    "unit_of_measurement": "%",
                    "friendly_name": "Battery level"
                },
                "last_changed": "2025-10-05T13:33:07.673333+00:00",
                "last_updated": "2025-10-05T13:33:07.673333+00:00"
            }
        "#;
        let state = serde_json::from_str::<EntityState>(RESPONSE)?;
        assert!(state.is_known());
        assert_eq!(state.state, "57.3");
        Ok(())
    }

    #[test]
    fn test_unknown_state() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"state": "unknown", "attributes": {}}"#;
        assert!(!serde_json::from_str::<EntityState>(RESPONSE)?.is_known());
        Ok(())
    }

    #[test]
    fn test_deserialize_forecast_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "entity_id": "sensor.power_production_next_24hours",
                "state": "4.2",
                "attributes": {
                    "power": [
                        {"time": "2025-06-21T04:00:00+02:00", "value": 0.0},
                        {"time": "garbage", "value": 0.1},
                        {"time": "2025-06-21T05:00:00+02:00", "value": 0.185}
                    ],
                    "friendly_name": "Power production next 24 hours"
                }
            }
        "#;
        let state = serde_json::from_str::<EntityState<ForecastAttributes>>(RESPONSE)?;
        let samples = state.attributes.power;
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[1].time,
            chrono::FixedOffset::east_opt(2 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 6, 21, 5, 0, 0)
                .unwrap()
                .with_timezone(&Local)
        );
        assert_abs_diff_eq!(samples[1].power.0, 0.185);
        Ok(())
    }
}
