use chrono::{DateTime, Local};
use serde_with::serde_as;

/// Response of `/api/history/period`: one list of state changes per requested entity.
#[must_use]
#[derive(serde::Deserialize, derive_more::IntoIterator)]
#[serde(bound(
    deserialize = "V: std::str::FromStr + serde::de::DeserializeOwned, <V as std::str::FromStr>::Err: std::fmt::Display"
))]
pub struct EntitiesHistory<V>(pub Vec<EntityHistory<V>>);

/// State changes of a single entity, skipping the `unavailable` and `unknown` ones.
#[must_use]
#[serde_as]
#[derive(serde::Deserialize, derive_more::Index, derive_more::IntoIterator)]
#[serde(bound(
    deserialize = "V: std::str::FromStr + serde::de::DeserializeOwned, <V as std::str::FromStr>::Err: std::fmt::Display"
))]
pub struct EntityHistory<V>(
    #[serde_as(as = "serde_with::VecSkipError<_>")] pub Vec<StateChange<V>>,
);

#[must_use]
#[serde_as]
#[derive(Copy, Clone, serde::Deserialize)]
#[serde(bound(
    deserialize = "V: std::str::FromStr + serde::de::DeserializeOwned, <V as std::str::FromStr>::Err: std::fmt::Display",
))]
pub struct StateChange<V> {
    #[serde(rename = "last_changed")]
    pub last_changed_at: DateTime<Local>,

    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(rename = "state")]
    pub value: V,
}

impl<V> From<StateChange<V>> for (DateTime<Local>, V) {
    fn from(change: StateChange<V>) -> Self {
        (change.last_changed_at, change.value)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::{prelude::*, quantity::energy::KilowattHours};

    #[test]
    fn test_deserialize_entities_history_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            [
                [
                    {
                        "entity_id": "sensor.total_consumed_energy",
                        "state": "unavailable",
                        "last_changed": "2025-10-05T13:30:00.000000+00:00",
                        "last_updated": "2025-10-05T13:30:00.000000+00:00"
                    },
                    {
                        "entity_id": "sensor.total_consumed_energy",
                        "state": "8123.25",
                        "last_changed": "2025-10-05T13:33:07.673333+00:00",
                        "last_updated": "2025-10-05T13:33:07.673333+00:00"
                    },
                    {
                        "entity_id": "sensor.total_consumed_energy",
                        "state": "8124.5",
                        "last_changed": "2025-10-05T14:00:00.000000+00:00",
                        "last_updated": "2025-10-05T14:00:00.000000+00:00"
                    }
                ]
            ]
        "#;
        let history = serde_json::from_str::<EntitiesHistory<KilowattHours>>(RESPONSE)?;
        let consumption = history.into_iter().next().unwrap();
        assert_eq!(consumption.0.len(), 2);
        let (last_changed_at, value): (DateTime<Local>, KilowattHours) = consumption[0].into();
        assert_eq!(
            last_changed_at,
            NaiveDate::from_ymd_opt(2025, 10, 5)
                .unwrap()
                .and_hms_micro_opt(13, 33, 7, 673_333)
                .unwrap()
                .and_utc()
                .with_timezone(&Local)
        );
        assert_abs_diff_eq!(value.0, 8123.25);
        Ok(())
    }
}
