//! Everything the scheduler talks to.

use chrono::{DateTime, Local, NaiveDate};

use crate::{
    core::{
        plan::Plan,
        quarter::{Quarter, QuarterSeries},
    },
    prelude::*,
    quantity::{
        energy::KilowattHours,
        percent::Percent,
        power::{Kilowatts, Watts},
        price::Price,
    },
};

pub trait Battery {
    fn start_charge(&mut self, target_soc: Percent, power: Watts) -> Result;

    fn stop_charge(&mut self) -> Result;

    fn start_discharge(&mut self) -> Result;

    fn stop_discharge(&mut self) -> Result;
}

pub trait Sensors {
    fn get_state_of_charge(&self) -> Result<Percent>;

    /// Cumulative household consumption readings, chronologically.
    fn get_consumption_history(
        &self,
        since: DateTime<Local>,
        until: DateTime<Local>,
    ) -> Result<Vec<(DateTime<Local>, KilowattHours)>>;

    /// Solar production forecast for the next day, chronologically.
    fn get_production_forecast(&self) -> Result<Vec<(DateTime<Local>, Kilowatts)>>;
}

pub trait PriceSource {
    /// Get the day's quarters, incomplete or empty when the prices are not published yet.
    fn get_quarters(&self, on: NaiveDate) -> Result<Vec<Quarter>>;

    /// Get today's and tomorrow's quarters, or [`None`] when either day is not available yet.
    fn get_upcoming_quarters(&self, today: NaiveDate) -> Result<Option<QuarterSeries>> {
        let tomorrow = today.succ_opt().context("the calendar has ended")?;
        let series =
            QuarterSeries::try_from_days(self.get_quarters(today)?, self.get_quarters(tomorrow)?);
        if series.is_none() {
            warn!(%today, "prices are not available yet");
        }
        Ok(series)
    }
}

/// Small pieces of state that outlive the process.
pub trait StateStore {
    /// Read and reset the one-shot flag that suppresses the next daily plan.
    fn take_skip_next_plan(&mut self) -> Result<bool>;

    fn set_skip_next_plan(&mut self) -> Result;

    fn get_last_full_balance(&self) -> Result<Option<DateTime<Local>>>;

    fn set_last_full_balance(&mut self, at: DateTime<Local>) -> Result;

    /// Highest price paid for the charge quarters during the latest planning.
    fn get_latest_high_charge_price(&self) -> Result<Option<Price>>;

    fn set_latest_high_charge_price(&mut self, price: Price) -> Result;

    fn set_last_charge_soc_delta(&mut self, delta: Percent) -> Result;
}

pub trait PlanStore {
    fn load(&self) -> Result<Option<Plan>>;

    /// Overwrite the stored plan.
    fn save(&mut self, plan: &Plan) -> Result;
}

/// Everything the scheduler needs from the home, except for the plan storage and timers.
pub trait Home: Battery + Sensors + PriceSource + StateStore {}

impl<T: Battery + Sensors + PriceSource + StateStore> Home for T {}
