mod history;
mod nordpool;
mod state;

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use http::{HeaderValue, header::AUTHORIZATION};
use serde::{Serialize, de::DeserializeOwned};
use ureq::Agent;

pub use self::nordpool::PriceArea;
use self::{
    history::EntitiesHistory,
    state::{EntityState, ForecastAttributes},
};
use crate::{
    core::quarter::Quarter,
    prelude::*,
    quantity::{
        energy::KilowattHours,
        percent::Percent,
        power::{Kilowatts, Watts},
        price::Price,
    },
    scheduler::ports::{Battery, PriceSource, Sensors, StateStore},
};

/// Entity IDs of the sensors, inverter controls, and helpers.
#[must_use]
#[derive(Clone, Debug)]
pub struct Entities {
    pub state_of_charge: String,
    pub total_consumption: String,
    pub production_forecast: String,

    pub ems_mode: String,
    pub forced_command: String,
    pub max_soc: String,
    pub forced_power: String,

    pub skip_next_plan: String,
    pub last_full_balance: String,
    pub latest_high_charge_price: String,
    pub last_charge_soc_delta: String,
}

/// Option values of the inverter's select entities.
mod option {
    pub const FORCED_MODE: &str = "Forced mode";
    pub const SELF_CONSUMPTION_MODE: &str = "Self-consumption mode (default)";
    pub const FORCED_CHARGE: &str = "Forced charge";
    pub const STOP: &str = "Stop (default)";
}

/// Home Assistant REST API client.
pub struct Api {
    client: Agent,
    base_url: String,
    authorization: HeaderValue,
    entities: Entities,
    price_area: PriceArea,
}

impl Api {
    pub fn new(
        base_url: &str,
        access_token: &str,
        entities: Entities,
        price_area: PriceArea,
    ) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .context("invalid access token")?;
        authorization.set_sensitive(true);
        let client =
            Agent::config_builder().timeout_global(Some(Duration::from_secs(10))).build().into();
        let base_url = format!("{}/api", base_url.trim_end_matches('/'));
        Ok(Self { client, base_url, authorization, entities, price_area })
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(entity_id = entity_id))]
    fn get_state<A: DeserializeOwned>(&self, entity_id: &str) -> Result<EntityState<A>> {
        self.client
            .get(format!("{}/states/{entity_id}", self.base_url))
            .header(AUTHORIZATION, self.authorization.clone())
            .call()
            .with_context(|| format!("failed to get the state of `{entity_id}`"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("failed to deserialize the state of `{entity_id}`"))
    }

    /// Get the entity's state, [`None`] when it is unknown.
    fn get_known_state(&self, entity_id: &str) -> Result<Option<String>> {
        let state = self.get_state::<serde::de::IgnoredAny>(entity_id)?;
        if state.is_known() {
            Ok(Some(state.state))
        } else {
            warn!(entity_id, state = %state.state, "unknown state");
            Ok(None)
        }
    }

    fn get_number(&self, entity_id: &str) -> Result<Option<f64>> {
        self.get_known_state(entity_id)?
            .map(|state| {
                state.parse().with_context(|| format!("`{entity_id}` is not a number: `{state}`"))
            })
            .transpose()
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(domain = domain, service = service))]
    fn call_service(&self, domain: &str, service: &str, body: impl Serialize) -> Result {
        self.client
            .post(format!("{}/services/{domain}/{service}", self.base_url))
            .header(AUTHORIZATION, self.authorization.clone())
            .send_json(body)
            .with_context(|| format!("failed to call `{domain}.{service}`"))?;
        Ok(())
    }

    fn select_option(&self, entity_id: &str, option: &str) -> Result {
        #[derive(Serialize)]
        struct Body<'a> {
            entity_id: &'a str,
            option: &'a str,
        }

        debug!(entity_id, option, "selecting…");
        self.call_service("input_select", "select_option", Body { entity_id, option })
    }

    fn set_number(&self, entity_id: &str, value: f64) -> Result {
        #[derive(Serialize)]
        struct Body<'a> {
            entity_id: &'a str,
            value: f64,
        }

        debug!(entity_id, value, "setting…");
        self.call_service("input_number", "set_value", Body { entity_id, value })
    }

    fn set_text(&self, entity_id: &str, value: &str) -> Result {
        #[derive(Serialize)]
        struct Body<'a> {
            entity_id: &'a str,
            value: &'a str,
        }

        debug!(entity_id, value, "setting…");
        self.call_service("input_text", "set_value", Body { entity_id, value })
    }

    fn switch(&self, entity_id: &str, is_on: bool) -> Result {
        #[derive(Serialize)]
        struct Body<'a> {
            entity_id: &'a str,
        }

        debug!(entity_id, is_on, "switching…");
        let service = if is_on { "turn_on" } else { "turn_off" };
        self.call_service("input_boolean", service, Body { entity_id })
    }
}

impl Battery for Api {
    #[instrument(skip_all, fields(target_soc = ?target_soc, power = ?power))]
    fn start_charge(&mut self, target_soc: Percent, power: Watts) -> Result {
        info!("forcing the charge…");
        self.select_option(&self.entities.ems_mode, option::FORCED_MODE)?;
        self.select_option(&self.entities.forced_command, option::FORCED_CHARGE)?;
        self.set_number(&self.entities.max_soc, target_soc.0)?;
        self.set_number(&self.entities.forced_power, power.0)
    }

    #[instrument(skip_all)]
    fn stop_charge(&mut self) -> Result {
        info!("stopping the forced charge…");
        self.select_option(&self.entities.forced_command, option::STOP)?;
        self.set_number(&self.entities.max_soc, Percent::HUNDRED.0)?;
        self.set_number(&self.entities.forced_power, 0.0)
    }

    #[instrument(skip_all)]
    fn start_discharge(&mut self) -> Result {
        info!("switching to the self-consumption…");
        self.select_option(&self.entities.ems_mode, option::SELF_CONSUMPTION_MODE)?;
        self.select_option(&self.entities.forced_command, option::STOP)?;
        self.set_number(&self.entities.max_soc, Percent::HUNDRED.0)?;
        self.set_number(&self.entities.forced_power, 0.0)
    }

    /// Forced mode without a forced command holds the battery idle.
    #[instrument(skip_all)]
    fn stop_discharge(&mut self) -> Result {
        info!("holding the battery…");
        self.select_option(&self.entities.ems_mode, option::FORCED_MODE)
    }
}

impl Sensors for Api {
    #[instrument(skip_all, name = "Reading the state-of-charge…")]
    fn get_state_of_charge(&self) -> Result<Percent> {
        let entity_id = &self.entities.state_of_charge;
        let value = self
            .get_number(entity_id)?
            .with_context(|| format!("`{entity_id}` is not available"))?;
        Ok(Percent(value))
    }

    #[instrument(skip_all, name = "Fetching the consumption history…", fields(since = %since))]
    fn get_consumption_history(
        &self,
        since: DateTime<Local>,
        until: DateTime<Local>,
    ) -> Result<Vec<(DateTime<Local>, KilowattHours)>> {
        let entity_id = &self.entities.total_consumption;
        let history: EntitiesHistory<KilowattHours> = self
            .client
            .get(format!("{}/history/period/{}", self.base_url, since.to_rfc3339()))
            .header(AUTHORIZATION, self.authorization.clone())
            .query("filter_entity_id", entity_id)
            .query("end_time", until.to_rfc3339())
            .query("no_attributes", "")
            .call()
            .with_context(|| format!("failed to fetch the history of `{entity_id}`"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("failed to deserialize the history of `{entity_id}`"))?;
        let readings: Vec<(DateTime<Local>, KilowattHours)> = history
            .into_iter()
            .next()
            .map(|entity| entity.into_iter().map(Into::into).collect())
            .unwrap_or_default();
        info!(n_readings = readings.len(), "fetched");
        Ok(readings)
    }

    #[instrument(skip_all, name = "Fetching the production forecast…")]
    fn get_production_forecast(&self) -> Result<Vec<(DateTime<Local>, Kilowatts)>> {
        let state = self.get_state::<ForecastAttributes>(&self.entities.production_forecast)?;
        info!(n_samples = state.attributes.power.len());
        Ok(state.attributes.power.into_iter().map(|sample| (sample.time, sample.power)).collect())
    }
}

impl PriceSource for Api {
    #[instrument(
        skip_all,
        name = "Fetching the prices…",
        fields(on = %on, area = %self.price_area.area),
    )]
    fn get_quarters(&self, on: NaiveDate) -> Result<Vec<Quarter>> {
        let result = self
            .client
            .post(format!(
                "{}/services/nordpool/get_prices_for_date?return_response",
                self.base_url,
            ))
            .header(AUTHORIZATION, self.authorization.clone())
            .send_json(self.price_area.request(on));
        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) if status >= 500 => {
                // Nord Pool fails the call until the auction results are published.
                warn!(status, "the prices are not published");
                return Ok(Vec::new());
            }
            Err(error) => {
                return Err(error).context("failed to call `nordpool.get_prices_for_date`");
            }
        };
        let mut response = response
            .body_mut()
            .read_json::<nordpool::Response>()
            .context("failed to deserialize the prices")?;
        let quarters: Vec<Quarter> = response
            .service_response
            .remove(&self.price_area.area)
            .unwrap_or_default()
            .into_iter()
            .map(Quarter::from)
            .collect();
        info!(n_quarters = quarters.len(), "fetched");
        Ok(quarters)
    }
}

impl StateStore for Api {
    #[instrument(skip_all, name = "Reading the skip flag…")]
    fn take_skip_next_plan(&mut self) -> Result<bool> {
        let entity_id = &self.entities.skip_next_plan;
        let is_set = self.get_known_state(entity_id)?.is_some_and(|state| state == "on");
        self.switch(entity_id, false)?;
        Ok(is_set)
    }

    fn set_skip_next_plan(&mut self) -> Result {
        self.switch(&self.entities.skip_next_plan, true)
    }

    #[instrument(skip_all, name = "Reading the last full balance…")]
    fn get_last_full_balance(&self) -> Result<Option<DateTime<Local>>> {
        let Some(state) = self.get_known_state(&self.entities.last_full_balance)? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&state) {
            Ok(at) => Ok(Some(at.with_timezone(&Local))),
            Err(error) => {
                warn!(%state, "invalid timestamp, assuming no balance: {error:#}");
                Ok(None)
            }
        }
    }

    fn set_last_full_balance(&mut self, at: DateTime<Local>) -> Result {
        self.set_text(&self.entities.last_full_balance, &at.to_rfc3339())
    }

    fn get_latest_high_charge_price(&self) -> Result<Option<Price>> {
        Ok(self.get_number(&self.entities.latest_high_charge_price)?.map(Price))
    }

    fn set_latest_high_charge_price(&mut self, price: Price) -> Result {
        self.set_number(&self.entities.latest_high_charge_price, price.0)
    }

    fn set_last_charge_soc_delta(&mut self, delta: Percent) -> Result {
        self.set_number(&self.entities.last_charge_soc_delta, delta.0)
    }
}
