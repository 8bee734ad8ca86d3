use clap::Parser;

use crate::quantity::{energy::WattHours, percent::Percent, power::Watts};

#[derive(Parser)]
pub struct BatteryArgs {
    /// Usable battery capacity.
    #[clap(
        long = "battery-capacity-watt-hours",
        env = "BATTERY_CAPACITY_WATT_HOURS",
        default_value = "25600"
    )]
    pub capacity: WattHours,

    /// Capacity assumed when deciding whether a discharge quarter may run.
    #[clap(
        long = "admission-capacity-watt-hours",
        env = "ADMISSION_CAPACITY_WATT_HOURS",
        default_value = "24320"
    )]
    pub admission_capacity: WattHours,

    #[clap(long = "min-soc-percent", env = "MIN_SOC_PERCENT", default_value = "10")]
    pub min_soc: Percent,

    #[clap(
        long = "max-charging-power-watts",
        env = "MAX_CHARGING_POWER_WATTS",
        default_value = "5000"
    )]
    pub max_charging_power: Watts,

    /// Lower charging power makes the planner drop the most expensive charge quarters.
    #[clap(
        long = "min-charging-power-watts",
        env = "MIN_CHARGING_POWER_WATTS",
        default_value = "800"
    )]
    pub min_charging_power: Watts,
}
