use chrono::NaiveTime;
use clap::Parser;

use crate::quantity::{percent::Percent, price::Price};

#[derive(Parser)]
pub struct PlannerArgs {
    /// Minimal difference between the discharge and charge prices.
    #[clap(long = "margin", env = "MARGIN", default_value = "300")]
    pub margin: Price,

    /// Maximal standard deviation of the charge quarter prices.
    #[clap(long = "max-std-dev", env = "MAX_STD_DEV", default_value = "75")]
    pub max_std_dev: Price,

    /// Night quarters under this price get charged regardless.
    #[clap(long = "cheap-price", env = "CHEAP_PRICE", default_value = "100")]
    pub cheap_price: Price,

    /// Discharge at the expensive day quarters above this state-of-charge
    /// when the night is not worth charging.
    #[clap(long = "fallback-soc-percent", env = "FALLBACK_SOC_PERCENT", default_value = "40")]
    pub fallback_soc: Percent,

    /// Period to average the household consumption over.
    #[clap(long = "consumption-window", env = "CONSUMPTION_WINDOW", default_value = "72h")]
    pub consumption_window: humantime::Duration,

    /// Latest expected start of the solar production.
    #[clap(long = "latest-solar-start", env = "LATEST_SOLAR_START", default_value = "09:00:00")]
    pub latest_solar_start: NaiveTime,

    /// How long to discharge in the morning before the solar production starts, in summer.
    #[clap(
        long = "solar-discharge-lead",
        env = "SOLAR_DISCHARGE_LEAD",
        default_value = "2h"
    )]
    pub solar_discharge_lead: humantime::Duration,

    /// Charge the battery full at least this often.
    #[clap(long = "balance-interval", env = "BALANCE_INTERVAL", default_value = "7days")]
    pub balance_interval: humantime::Duration,
}
