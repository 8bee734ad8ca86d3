use chrono::{DateTime, Local};

use crate::{
    core::plan::{ChargeWindow, DischargeQuarter},
    prelude::*,
    scheduler::{
        Scheduler,
        action::Action,
        admission::{discharge_budget, is_admitted, rank},
        planning::estimate_consumption,
        ports::{Home, PlanStore},
        timer::Timers,
    },
};

impl<H: Home, P: PlanStore, T: Timers> Scheduler<H, P, T> {
    #[instrument(
        skip_all,
        name = "Starting the charge…",
        fields(start = %window.start, end = %window.end),
    )]
    pub(super) fn start_charge(&mut self, window: ChargeWindow, now: DateTime<Local>) -> Result {
        if !window.interval().contains(now) {
            info!("the window is not active, ignoring");
            return Ok(());
        }
        let state_of_charge = self
            .home
            .get_state_of_charge()
            .inspect_err(|error| warn!("failed to read the state-of-charge: {error:#}"))
            .ok();
        info!(
            target_soc = ?window.target_soc,
            power = ?window.power,
            current_soc = ?state_of_charge,
        );
        self.home.start_charge(window.target_soc, window.power)?;
        self.charge_started_at_soc = state_of_charge;
        Ok(())
    }

    #[instrument(skip_all, name = "Stopping the charge…", fields(end = %window.end))]
    pub(super) fn stop_charge(&mut self, window: ChargeWindow, now: DateTime<Local>) -> Result {
        if now < window.end {
            info!("the window has not ended yet, ignoring");
            return Ok(());
        }
        let state_of_charge = self.home.get_state_of_charge();
        self.home.stop_charge()?;
        match (state_of_charge, self.charge_started_at_soc.take()) {
            (Ok(state_of_charge), Some(started_at_soc)) => {
                let delta = state_of_charge - started_at_soc;
                info!(?state_of_charge, ?delta, "charged");
                self.home.set_last_charge_soc_delta(delta)?;
            }
            (Ok(_), None) => {
                warn!("unknown state-of-charge at the start, not recording the delta");
            }
            (Err(error), _) => {
                warn!("failed to read the state-of-charge: {error:#}");
            }
        }
        Ok(())
    }

    /// Discharge unconditionally, or only when the quarter is among the most expensive ones
    /// the battery can still cover.
    #[instrument(
        skip_all,
        name = "Starting the discharge…",
        fields(start = %quarter.start, price = ?quarter.price),
    )]
    pub(super) fn start_discharge(
        &mut self,
        quarter: DischargeQuarter,
        now: DateTime<Local>,
    ) -> Result {
        if !quarter.interval().contains(now) {
            info!("the quarter is not active, ignoring");
            return Ok(());
        }
        if quarter.is_ranked() {
            let Some(rank) = rank(&self.plan.discharge, quarter, now) else {
                info!("the quarter is not scheduled anymore, ignoring");
                return Ok(());
            };
            let budget = match self.read_discharge_budget(now) {
                Ok(budget) => budget,
                Err(error) => {
                    // The previous quarter may still be discharging.
                    self.home.stop_discharge()?;
                    return Err(error);
                }
            };
            info!(rank, ?budget);
            if !is_admitted(rank, budget) {
                info!("saving the energy for the more expensive quarters");
                return self.home.stop_discharge();
            }
        }
        self.home.start_discharge()?;
        self.arm(quarter.end, Action::StopDischarge);
        Ok(())
    }

    fn read_discharge_budget(&self, now: DateTime<Local>) -> Result<Option<usize>> {
        let state_of_charge = self.home.get_state_of_charge()?;
        let average_quarter_energy = estimate_consumption(&self.home, &self.settings, now)?;
        info!(?state_of_charge);
        Ok(discharge_budget(&self.settings, state_of_charge, average_quarter_energy))
    }

    #[instrument(skip_all, name = "Stopping the discharge…")]
    pub(super) fn stop_discharge(&mut self, now: DateTime<Local>) -> Result {
        if self.plan.discharge.iter().any(|quarter| quarter.interval().contains(now)) {
            info!("the next quarter has begun, ignoring");
            return Ok(());
        }
        self.home.stop_discharge()
    }
}
