mod battery;
mod home_assistant;
mod planner;
mod schedule;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::home_assistant::HomeAssistantArgs;
use crate::{
    cli::{battery::BatteryArgs, planner::PlannerArgs, schedule::ScheduleArgs},
    core::settings::Settings,
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: restore the plan, then plan and control the battery every day.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Plan the upcoming night and day without touching the battery, and print the plan.
    #[clap(name = "plan")]
    Plan(Box<PlanArgs>),

    /// Print the saved plan.
    #[clap(name = "show")]
    Show(PlanFileArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    #[clap(flatten)]
    pub settings: SettingsArgs,

    #[clap(flatten)]
    pub plan_file: PlanFileArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,
}

#[derive(Parser)]
pub struct PlanArgs {
    #[clap(flatten)]
    pub settings: SettingsArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,
}

#[derive(Parser)]
pub struct PlanFileArgs {
    /// JSON file with the active plan, restored on start.
    #[clap(long = "plan-path", env = "PLAN_PATH", default_value = "owlet-plan.json")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct SettingsArgs {
    #[clap(flatten)]
    battery: BatteryArgs,

    #[clap(flatten)]
    planner: PlannerArgs,

    #[clap(flatten)]
    schedule: ScheduleArgs,
}

impl SettingsArgs {
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings::builder()
            .capacity(self.battery.capacity)
            .admission_capacity(self.battery.admission_capacity)
            .min_soc(self.battery.min_soc)
            .max_charging_power(self.battery.max_charging_power)
            .min_charging_power(self.battery.min_charging_power)
            .margin(self.planner.margin)
            .max_std_dev(self.planner.max_std_dev)
            .cheap_price(self.planner.cheap_price)
            .fallback_soc(self.planner.fallback_soc)
            .consumption_window(time_delta(&self.planner.consumption_window)?)
            .latest_solar_start(self.planner.latest_solar_start)
            .solar_discharge_lead(time_delta(&self.planner.solar_discharge_lead)?)
            .balance_interval(time_delta(&self.planner.balance_interval)?)
            .daily_plan_at(self.schedule.daily_plan_at)
            .mid_day_check_at(self.schedule.mid_day_check_at)
            .retry_delay(time_delta(&self.schedule.retry_delay)?)
            .max_attempts(self.schedule.max_attempts)
            .build())
    }
}

fn time_delta(duration: &humantime::Duration) -> Result<chrono::TimeDelta> {
    chrono::TimeDelta::from_std(**duration).with_context(|| format!("`{duration}` is out of range"))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeDelta};

    use super::*;
    use crate::quantity::{energy::WattHours, percent::Percent, price::Price};

    #[test]
    fn test_default_settings() -> Result {
        let Command::Plan(args) = Args::try_parse_from([
            "owlet",
            "plan",
            "--home-assistant-url",
            "http://localhost:8123",
            "--home-assistant-access-token",
            "token",
            "--nordpool-config-entry",
            "entry",
        ])?
        .command
        else {
            bail!("expected the plan command");
        };
        let settings = args.settings.settings()?;
        let defaults = Settings::default();
        assert_eq!(settings.capacity, defaults.capacity);
        assert_eq!(settings.min_soc, defaults.min_soc);
        assert_eq!(settings.margin, defaults.margin);
        assert_eq!(settings.consumption_window, defaults.consumption_window);
        assert_eq!(settings.balance_interval, defaults.balance_interval);
        assert_eq!(settings.daily_plan_at, defaults.daily_plan_at);
        assert_eq!(settings.retry_delay, defaults.retry_delay);
        assert_eq!(settings.max_attempts, defaults.max_attempts);
        Ok(())
    }

    #[test]
    fn test_overridden_settings() -> Result {
        let Command::Run(args) = Args::try_parse_from([
            "owlet",
            "run",
            "--home-assistant-url",
            "http://localhost:8123",
            "--home-assistant-access-token",
            "token",
            "--nordpool-config-entry",
            "entry",
            "--battery-capacity-watt-hours",
            "10000",
            "--min-soc-percent",
            "15",
            "--margin",
            "250.5",
            "--daily-plan-at",
            "22:10:00",
            "--retry-delay",
            "5min",
            "--plan-path",
            "/tmp/plan.json",
        ])?
        .command
        else {
            bail!("expected the run command");
        };
        let settings = args.settings.settings()?;
        assert_eq!(settings.capacity, WattHours(10000.0));
        assert_eq!(settings.min_soc, Percent(15.0));
        assert_eq!(settings.margin, Price(250.5));
        assert_eq!(settings.daily_plan_at, NaiveTime::from_hms_opt(22, 10, 0).unwrap());
        assert_eq!(settings.retry_delay, TimeDelta::minutes(5));
        assert_eq!(args.plan_file.path, PathBuf::from("/tmp/plan.json"));
        Ok(())
    }
}
