use bon::Builder;
use chrono::{NaiveTime, TimeDelta};

use crate::quantity::{energy::WattHours, percent::Percent, power::Watts, price::Price};

const fn time_of_day(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => time,
        None => panic!("invalid time of day"),
    }
}

/// Immutable planning and execution parameters.
#[must_use]
#[derive(Copy, Clone, Debug, Builder)]
pub struct Settings {
    /// Usable battery capacity.
    #[builder(default = WattHours(25600.0))]
    pub capacity: WattHours,

    /// Capacity used to estimate how many quarters the battery can discharge during execution.
    #[builder(default = WattHours(24320.0))]
    pub admission_capacity: WattHours,

    #[builder(default = Percent(10.0))]
    pub min_soc: Percent,

    #[builder(default = Watts(5000.0))]
    pub max_charging_power: Watts,

    /// Charging slower than this is inefficient, so the most expensive quarters get dropped.
    #[builder(default = Watts(800.0))]
    pub min_charging_power: Watts,

    /// Minimal difference between the charge and discharge prices.
    #[builder(default = Price(300.0))]
    pub margin: Price,

    /// Maximal population standard deviation of the charge quarter prices.
    #[builder(default = Price(75.0))]
    pub max_std_dev: Price,

    /// Night quarters under this price are always charged.
    #[builder(default = Price(100.0))]
    pub cheap_price: Price,

    /// Above this state-of-charge, the battery discharges at the expensive day quarters
    /// even when the optimizer found nothing.
    #[builder(default = Percent(40.0))]
    pub fallback_soc: Percent,

    #[builder(default = TimeDelta::hours(72))]
    pub consumption_window: TimeDelta,

    #[builder(default = time_of_day(21, 55))]
    pub daily_plan_at: NaiveTime,

    #[builder(default = time_of_day(14, 0))]
    pub mid_day_check_at: NaiveTime,

    #[builder(default = TimeDelta::minutes(15))]
    pub retry_delay: TimeDelta,

    #[builder(default = 8)]
    pub max_attempts: u32,

    /// Latest start of the morning solar production.
    #[builder(default = time_of_day(9, 0))]
    pub latest_solar_start: NaiveTime,

    /// How long the battery discharges before the solar production starts.
    #[builder(default = TimeDelta::hours(2))]
    pub solar_discharge_lead: TimeDelta,

    /// The battery gets charged to 100% at least this often.
    #[builder(default = TimeDelta::days(7))]
    pub balance_interval: TimeDelta,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Settings {
    /// Energy that must stay in the battery.
    #[must_use]
    pub fn min_residual_energy(&self) -> WattHours {
        self.capacity * self.min_soc.to_proportion()
    }
}
