use clap::Parser;

use crate::{
    api::home_assistant::{Api, Entities, PriceArea},
    prelude::*,
};

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant base URL, for example `http://homeassistant.local:8123`.
    #[clap(long = "home-assistant-url", env = "HOME_ASSISTANT_URL")]
    url: String,

    /// Long-lived access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    access_token: String,

    #[clap(flatten)]
    entities: EntityArgs,

    #[clap(flatten)]
    nordpool: NordPoolArgs,
}

impl HomeAssistantArgs {
    pub fn connect(&self) -> Result<Api> {
        let entities = self.entities.clone().into();
        Api::new(&self.url, &self.access_token, entities, self.nordpool.clone().into())
    }
}

#[derive(Clone, Parser)]
struct NordPoolArgs {
    /// Configuration entry ID of the Nord Pool integration.
    #[clap(long = "nordpool-config-entry", env = "NORDPOOL_CONFIG_ENTRY")]
    config_entry: String,

    #[clap(long = "nordpool-area", env = "NORDPOOL_AREA", default_value = "SE3")]
    area: String,

    #[clap(long = "nordpool-currency", env = "NORDPOOL_CURRENCY", default_value = "SEK")]
    currency: String,
}

impl From<NordPoolArgs> for PriceArea {
    fn from(args: NordPoolArgs) -> Self {
        Self { config_entry: args.config_entry, area: args.area, currency: args.currency }
    }
}

#[derive(Clone, Parser)]
struct EntityArgs {
    #[clap(long, env = "STATE_OF_CHARGE_ENTITY_ID", default_value = "sensor.battery_level")]
    state_of_charge_entity_id: String,

    /// Cumulative household consumption in kilowatt-hours.
    #[clap(
        long,
        env = "TOTAL_CONSUMPTION_ENTITY_ID",
        default_value = "sensor.total_consumed_energy"
    )]
    total_consumption_entity_id: String,

    /// Sensor with the `power` attribute listing the forecast in kilowatts.
    #[clap(
        long,
        env = "PRODUCTION_FORECAST_ENTITY_ID",
        default_value = "sensor.power_production_next_24hours"
    )]
    production_forecast_entity_id: String,

    #[clap(long, env = "EMS_MODE_ENTITY_ID", default_value = "input_select.set_sg_ems_mode")]
    ems_mode_entity_id: String,

    #[clap(
        long,
        env = "FORCED_COMMAND_ENTITY_ID",
        default_value = "input_select.set_sg_battery_forced_charge_discharge_cmd"
    )]
    forced_command_entity_id: String,

    #[clap(long, env = "MAX_SOC_ENTITY_ID", default_value = "input_number.set_sg_max_soc")]
    max_soc_entity_id: String,

    #[clap(
        long,
        env = "FORCED_POWER_ENTITY_ID",
        default_value = "input_number.set_sg_forced_charge_discharge_power"
    )]
    forced_power_entity_id: String,

    #[clap(
        long,
        env = "SKIP_NEXT_PLAN_ENTITY_ID",
        default_value = "input_boolean.skip_next_battery_schedule"
    )]
    skip_next_plan_entity_id: String,

    #[clap(
        long,
        env = "LAST_FULL_BALANCE_ENTITY_ID",
        default_value = "input_text.latest_battery_balance_upper"
    )]
    last_full_balance_entity_id: String,

    #[clap(
        long,
        env = "LATEST_HIGH_CHARGE_PRICE_ENTITY_ID",
        default_value = "input_number.latest_night_charge_high_price"
    )]
    latest_high_charge_price_entity_id: String,

    #[clap(
        long,
        env = "LAST_CHARGE_SOC_DELTA_ENTITY_ID",
        default_value = "input_number.latest_charge_soc"
    )]
    last_charge_soc_delta_entity_id: String,
}

impl From<EntityArgs> for Entities {
    fn from(args: EntityArgs) -> Self {
        Self {
            state_of_charge: args.state_of_charge_entity_id,
            total_consumption: args.total_consumption_entity_id,
            production_forecast: args.production_forecast_entity_id,
            ems_mode: args.ems_mode_entity_id,
            forced_command: args.forced_command_entity_id,
            max_soc: args.max_soc_entity_id,
            forced_power: args.forced_power_entity_id,
            skip_next_plan: args.skip_next_plan_entity_id,
            last_full_balance: args.last_full_balance_entity_id,
            latest_high_charge_price: args.latest_high_charge_price_entity_id,
            last_charge_soc_delta: args.last_charge_soc_delta_entity_id,
        }
    }
}
