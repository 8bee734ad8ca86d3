use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{core::quarter::Quarter, quantity::price::Price};

/// Parameters of the `nordpool.get_prices_for_date` service call.
#[must_use]
#[derive(Clone, Debug)]
pub struct PriceArea {
    /// Configuration entry ID of the Nord Pool integration.
    pub config_entry: String,

    pub area: String,
    pub currency: String,
}

impl PriceArea {
    pub fn request(&self, date: NaiveDate) -> Request<'_> {
        Request {
            config_entry: &self.config_entry,
            date,
            areas: &self.area,
            currency: &self.currency,
        }
    }
}

#[derive(Serialize)]
pub struct Request<'a> {
    config_entry: &'a str,
    date: NaiveDate,
    areas: &'a str,
    currency: &'a str,
}

/// Envelope of a service call made with `return_response`.
#[must_use]
#[derive(Deserialize)]
pub struct Response {
    pub service_response: HashMap<String, Vec<Entry>>,
}

#[must_use]
#[derive(Copy, Clone, Deserialize)]
pub struct Entry {
    pub start: DateTime<Local>,
    pub price: f64,
}

impl From<Entry> for Quarter {
    fn from(entry: Entry) -> Self {
        Self::new(entry.start, Price(entry.price))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_serialize_request_ok() -> Result {
        let area = PriceArea {
            config_entry: "01KBGCDMY25VMPA5FNMZCFKN4H".to_string(),
            area: "SE3".to_string(),
            currency: "SEK".to_string(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(
            serde_json::to_string(&area.request(date))?,
            r#"{"config_entry":"01KBGCDMY25VMPA5FNMZCFKN4H","date":"2025-01-16","areas":"SE3","currency":"SEK"}"#,
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_response_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "changed_states": [],
                "service_response": {
                    "SE3": [
                        {
                            "start": "2025-01-15T23:00:00+00:00",
                            "end": "2025-01-15T23:15:00+00:00",
                            "price": 412.07
                        },
                        {
                            "start": "2025-01-15T23:15:00+00:00",
                            "end": "2025-01-15T23:30:00+00:00",
                            "price": 398.5
                        }
                    ]
                }
            }
        "#;
        let response = serde_json::from_str::<Response>(RESPONSE)?;
        let quarters: Vec<Quarter> =
            response.service_response["SE3"].iter().copied().map(Quarter::from).collect();
        assert_eq!(quarters.len(), 2);
        assert_eq!(quarters[0].start, chrono::Utc.with_ymd_and_hms(2025, 1, 15, 23, 0, 0).unwrap());
        assert_eq!(quarters[1].price, Price(398.5));
        Ok(())
    }
}
