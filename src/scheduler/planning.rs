use chrono::{DateTime, Local, TimeDelta};
use itertools::Itertools;

use crate::{
    core::{
        consumption::average_quarter_energy,
        plan::{DischargeQuarter, Plan},
        planner::Optimizer,
        quarter::{Quarter, QuarterSeries},
        season::is_summer,
        settings::Settings,
        solar::SolarWindow,
        target::{ChargeCalculator, ChargeTarget},
    },
    prelude::*,
    quantity::{energy::WattHours, percent::Percent, price::Price},
    scheduler::{
        Scheduler,
        action::{Action, TimerCategory},
        at_local,
        ports::{Home, PlanStore, Sensors},
        timer::Timers,
    },
};

/// Outcome of a planning pass, before anything gets armed.
#[must_use]
#[derive(Clone, Debug)]
pub struct Proposal {
    pub plan: Plan,

    /// [`None`] when there is nothing to charge.
    pub charge_target: Option<ChargeTarget>,

    pub state_of_charge: Percent,
    pub average_quarter_energy: WattHours,
}

/// Plan the upcoming night and day without any side effects.
///
/// Returns [`None`] when the prices are not available yet.
#[instrument(skip_all, name = "Planning…", fields(now = %now))]
pub fn propose<H: Home>(
    home: &H,
    settings: &Settings,
    now: DateTime<Local>,
) -> Result<Option<Proposal>> {
    let today = now.date_naive();
    let state_of_charge = home.get_state_of_charge()?;
    info!(?state_of_charge, summer = is_summer(today));

    if is_summer(today) {
        let tomorrow = today.succ_opt().context("the calendar has ended")?;
        let latest_start = at_local(tomorrow, settings.latest_solar_start)
            .context("the latest solar start does not exist tomorrow")?;
        let forecast = home.get_production_forecast()?;
        let solar_window = SolarWindow::detect(forecast.into_iter().filter(|(at, _)| *at > now));
        info!(start = ?solar_window.start, end = ?solar_window.end, "detected the solar window");
        let anchor = solar_window.start.map_or(latest_start, |start| start.min(latest_start));
        let discharge = DischargeQuarter::unranked(
            anchor - settings.solar_discharge_lead,
            anchor - TimeDelta::minutes(1),
        );
        return Ok(Some(Proposal {
            plan: Plan { charge: Vec::new(), discharge: vec![discharge] },
            charge_target: None,
            state_of_charge,
            average_quarter_energy: WattHours::ZERO,
        }));
    }

    let Some(quarters) = home.get_upcoming_quarters(today)? else {
        return Ok(None);
    };
    let average_quarter_energy = estimate_consumption(home, settings, now)?;
    let night_plan = Optimizer::builder()
        .settings(settings)
        .quarters(&quarters)
        .average_quarter_energy(average_quarter_energy)
        .state_of_charge(state_of_charge)
        .optimize();
    info!(
        max_charge_price = ?night_plan.max_charge_price,
        n_estimated_discharge_quarters = night_plan.n_estimated_discharge_quarters,
        "night plan",
    );

    let mut discharge = night_plan.discharge;
    if state_of_charge > settings.fallback_soc && discharge.is_empty() {
        match home.get_latest_high_charge_price()? {
            Some(reference) => {
                info!(?reference, "discharging at the expensive day quarters anyway");
                discharge = expensive_quarters(quarters.day(), reference + settings.margin);
            }
            None => {
                warn!("no reference charge price, skipping the fallback discharge");
            }
        }
    }

    let is_balancing = home
        .get_last_full_balance()?
        .is_none_or(|balanced_at| now - balanced_at >= settings.balance_interval);
    let charge_target = ChargeCalculator::builder()
        .settings(settings)
        .charge_quarters(&night_plan.charge)
        .n_discharge_quarters(discharge.len())
        .average_quarter_energy(average_quarter_energy)
        .state_of_charge(state_of_charge)
        .is_balancing(is_balancing)
        .date(today)
        .calculate();

    let plan = Plan {
        charge: charge_target.as_ref().map(|target| target.windows.clone()).unwrap_or_default(),
        discharge: discharge.into_iter().map(DischargeQuarter::from).collect(),
    };
    Ok(Some(Proposal { plan, charge_target, state_of_charge, average_quarter_energy }))
}

pub(super) fn estimate_consumption<S: Sensors>(
    sensors: &S,
    settings: &Settings,
    now: DateTime<Local>,
) -> Result<WattHours> {
    let readings = sensors.get_consumption_history(now - settings.consumption_window, now)?;
    let average_quarter_energy = average_quarter_energy(&readings);
    info!(n_readings = readings.len(), ?average_quarter_energy, "estimated the consumption");
    Ok(average_quarter_energy)
}

fn expensive_quarters(quarters: &[Quarter], min_price: Price) -> Vec<Quarter> {
    quarters.iter().filter(|quarter| quarter.price >= min_price).copied().collect_vec()
}

impl<H: Home, P: PlanStore, T: Timers> Scheduler<H, P, T> {
    /// Replace the active plan with a plan for the next night and day.
    #[instrument(skip_all, name = "Planning the next day…", fields(attempt = attempt))]
    pub(super) fn plan_next_day(&mut self, attempt: u32, now: DateTime<Local>) -> Result {
        if attempt == 0 {
            self.arm_daily_plan(now);
            if self.home.take_skip_next_plan()? {
                info!("skipping the plan once");
                return Ok(());
            }
        }

        let Some(proposal) = propose(&self.home, &self.settings, now)? else {
            self.retry(Action::Plan { attempt: attempt + 1 }, attempt, now);
            return Ok(());
        };
        self.cancel(TimerCategory::Charge | TimerCategory::Discharge);

        if let Some(charge_target) = &proposal.charge_target {
            if charge_target.is_full() {
                self.home.set_last_full_balance(now)?;
            }
            self.home.set_latest_high_charge_price(charge_target.high_price)?;
        }
        info!(
            n_charge_windows = proposal.plan.charge.len(),
            n_discharge_quarters = proposal.plan.discharge.len(),
            "planned",
        );
        self.plan = proposal.plan;
        self.arm_plan(now);
        self.plan_store.save(&self.plan)
    }

    /// Discharge the afternoon and evening when the night turns out to be worth charging,
    /// and suppress the next daily plan.
    #[instrument(skip_all, name = "Checking the night charge…", fields(attempt = attempt))]
    pub(super) fn check_mid_day(&mut self, attempt: u32, now: DateTime<Local>) -> Result {
        if attempt == 0 {
            self.arm_mid_day_check(now);
        }
        let today = now.date_naive();
        if is_summer(today) {
            return Ok(());
        }

        let Some(quarters) = self.home.get_upcoming_quarters(today)? else {
            self.retry(Action::MidDayCheck { attempt: attempt + 1 }, attempt, now);
            return Ok(());
        };
        let average_quarter_energy = estimate_consumption(&self.home, &self.settings, now)?;
        let probe = Optimizer::builder()
            .settings(&self.settings)
            .quarters(&quarters)
            .average_quarter_energy(average_quarter_energy)
            .state_of_charge(self.settings.min_soc)
            .optimize();
        if probe.charge.iter().all(|quarter| self.plan.is_charging_at(*quarter)) {
            info!(n_charge_quarters = probe.charge.len(), "nothing new to charge");
            return Ok(());
        }
        let Some(reference) = self.home.get_latest_high_charge_price()? else {
            warn!("no reference charge price, keeping the plan");
            return Ok(());
        };

        self.cancel(TimerCategory::Discharge.into());
        self.plan.discharge = discharge_schedule(&quarters, reference + self.settings.margin);
        info!(n_discharge_quarters = self.plan.discharge.len(), "rescheduled the discharge");
        self.arm_discharge(now);
        self.plan_store.save(&self.plan)?;
        self.home.set_skip_next_plan()
    }
}

/// Quarters from this afternoon until tomorrow evening worth discharging.
fn discharge_schedule(quarters: &QuarterSeries, min_price: Price) -> Vec<DischargeQuarter> {
    expensive_quarters(quarters.afternoon_to_evening(), min_price)
        .into_iter()
        .map(DischargeQuarter::from)
        .collect()
}
