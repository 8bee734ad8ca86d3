//! Timer-driven execution of the daily battery plan.

mod action;
mod admission;
mod execution;
mod planning;
pub mod ports;
pub mod store;
pub mod timer;

use bon::Builder;
use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use enumset::EnumSet;

pub use self::planning::propose;
use crate::{
    core::{plan::Plan, settings::Settings},
    prelude::*,
    quantity::percent::Percent,
    scheduler::{
        action::{Action, Handles, TimerCategory},
        ports::{Home, PlanStore},
        timer::{TimerHandle, TimerQueue, Timers},
    },
};

/// Owns the active plan and the armed timers.
///
/// Nothing here is fatal: failed actions get logged, and the next trigger tries again.
#[derive(Builder)]
pub struct Scheduler<H, P, T> {
    home: H,
    plan_store: P,
    timers: T,
    settings: Settings,

    #[builder(skip)]
    handles: Handles,

    #[builder(skip)]
    plan: Plan,

    /// State-of-charge at the moment the current charge window has started.
    #[builder(skip)]
    charge_started_at_soc: Option<Percent>,
}

impl<H, P, T> Scheduler<H, P, T> {
    pub const fn plan(&self) -> &Plan {
        &self.plan
    }

    #[cfg(test)]
    pub const fn home(&self) -> &H {
        &self.home
    }

    #[cfg(test)]
    pub const fn timers(&self) -> &T {
        &self.timers
    }
}

impl<H: Home, P: PlanStore, T: Timers> Scheduler<H, P, T> {
    /// Restore the saved plan and arm the daily triggers.
    #[instrument(skip_all, name = "Starting the scheduler…")]
    pub fn start(&mut self, now: DateTime<Local>) {
        self.plan = self
            .plan_store
            .load()
            .unwrap_or_else(|error| {
                error!("failed to load the plan, starting from scratch: {error:#}");
                None
            })
            .unwrap_or_default();
        self.arm_plan(now);
        self.arm_daily_plan(now);
        self.arm_mid_day_check(now);
    }

    /// Handle the fired timer.
    pub fn fire(&mut self, handle: TimerHandle, action: Action, now: DateTime<Local>) {
        self.handles.remove(handle);
        self.execute(action, now);
    }

    #[instrument(skip_all, fields(action = ?action))]
    fn execute(&mut self, action: Action, now: DateTime<Local>) {
        let result = match action {
            Action::Plan { attempt } => self.plan_next_day(attempt, now),
            Action::MidDayCheck { attempt } => self.check_mid_day(attempt, now),
            Action::StartCharge(window) => self.start_charge(window, now),
            Action::StopCharge(window) => self.stop_charge(window, now),
            Action::StartDischarge(quarter) => self.start_discharge(quarter, now),
            Action::StopDischarge => self.stop_discharge(now),
        };
        if let Err(error) = result {
            error!("failed to execute the action: {error:#}");
        }
    }

    fn arm(&mut self, at: DateTime<Local>, action: Action) {
        debug!(%at, ?action, "arming…");
        let handle = self.timers.schedule(at, action);
        self.handles.insert(action.category(), handle);
    }

    fn cancel(&mut self, categories: EnumSet<TimerCategory>) {
        for handle in self.handles.drain(categories) {
            self.timers.cancel(handle);
        }
    }

    /// Arm the timers for the active plan.
    ///
    /// Windows which have already begun start right away, and only their stop timers get armed.
    fn arm_plan(&mut self, now: DateTime<Local>) {
        for window in self.plan.charge.clone() {
            let interval = window.interval();
            if interval.is_before(now) {
                continue;
            }
            if interval.is_after(now) {
                self.arm(window.start, Action::StartCharge(window));
            } else {
                info!(?interval, "resuming the charge window");
                self.execute(Action::StartCharge(window), now);
            }
            self.arm(window.end, Action::StopCharge(window));
        }
        self.arm_discharge(now);
    }

    /// Arm the discharge quarters of the active plan, starting the active one right away.
    fn arm_discharge(&mut self, now: DateTime<Local>) {
        for quarter in self.plan.discharge.clone() {
            let interval = quarter.interval();
            if interval.is_before(now) {
                continue;
            }
            if interval.is_after(now) {
                self.arm(quarter.start, Action::StartDischarge(quarter));
            } else {
                info!(?interval, "resuming the discharge quarter");
                self.execute(Action::StartDischarge(quarter), now);
            }
        }
    }

    fn arm_daily_plan(&mut self, now: DateTime<Local>) {
        if let Some(at) = next_occurrence(now, self.settings.daily_plan_at) {
            self.arm(at, Action::Plan { attempt: 0 });
        }
    }

    fn arm_mid_day_check(&mut self, now: DateTime<Local>) {
        if let Some(at) = next_occurrence(now, self.settings.mid_day_check_at) {
            self.arm(at, Action::MidDayCheck { attempt: 0 });
        }
    }

    /// Try again later unless the attempts are exhausted.
    fn retry(&mut self, action: Action, attempt: u32, now: DateTime<Local>) {
        if attempt >= self.settings.max_attempts {
            warn!(attempt, "giving up until the next trigger");
        } else {
            self.arm(now + self.settings.retry_delay, action);
        }
    }
}

impl<H: Home, P: PlanStore> Scheduler<H, P, TimerQueue> {
    /// Fire all the timers which are due.
    pub fn fire_due(&mut self, now: DateTime<Local>) {
        while let Some((handle, action)) = self.timers.pop_due(now) {
            self.fire(handle, action, now);
        }
    }

    pub fn next_due(&mut self) -> Option<DateTime<Local>> {
        self.timers.next_due()
    }
}

/// Local time on the date, the earliest one when the clock goes back.
fn at_local(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    date.and_time(time).and_local_timezone(Local).earliest()
}

/// The first moment strictly after now when the wall clock shows the time.
fn next_occurrence(now: DateTime<Local>, time: NaiveTime) -> Option<DateTime<Local>> {
    now.date_naive()
        .iter_days()
        .take(3)
        .filter_map(|date| at_local(date, time))
        .find(|at| *at > now)
}
