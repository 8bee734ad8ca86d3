use chrono::NaiveTime;
use clap::Parser;

#[derive(Parser)]
pub struct ScheduleArgs {
    /// Local time to plan the next night and day.
    #[clap(long = "daily-plan-at", env = "DAILY_PLAN_AT", default_value = "21:55:00")]
    pub daily_plan_at: NaiveTime,

    /// Local time to check whether the afternoon is worth discharging.
    #[clap(long = "mid-day-check-at", env = "MID_DAY_CHECK_AT", default_value = "14:00:00")]
    pub mid_day_check_at: NaiveTime,

    /// Delay before retrying when the prices are not available yet.
    #[clap(long = "retry-delay", env = "RETRY_DELAY", default_value = "15min")]
    pub retry_delay: humantime::Duration,

    #[clap(long = "max-attempts", env = "MAX_ATTEMPTS", default_value = "8")]
    pub max_attempts: u32,
}
