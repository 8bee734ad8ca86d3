//! Execution-time decision whether a ranked quarter may discharge.

use std::cmp::Reverse;

use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::{
    core::{plan::DischargeQuarter, settings::Settings},
    quantity::{energy::WattHours, percent::Percent},
};

/// The battery usually lasts a bit longer than the nominal capacity suggests.
const DISCHARGE_ALLOWANCE: f64 = 1.15;

/// Position of the quarter among the scheduled quarters which have not ended yet,
/// the most expensive first.
///
/// Returns [`None`] when the quarter is not scheduled.
#[must_use]
pub fn rank(
    schedule: &[DischargeQuarter],
    quarter: DischargeQuarter,
    now: DateTime<Local>,
) -> Option<usize> {
    schedule
        .iter()
        .filter(|scheduled| !scheduled.interval().is_before(now))
        .sorted_by_key(|scheduled| (Reverse(scheduled.price), scheduled.start))
        .position(|scheduled| scheduled.start == quarter.start)
}

/// Number of the most expensive quarters the battery can still cover.
///
/// Returns [`None`] when the consumption is unknown, and then nothing may discharge.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn discharge_budget(
    settings: &Settings,
    state_of_charge: Percent,
    average_quarter_energy: WattHours,
) -> Option<usize> {
    if average_quarter_energy <= WattHours::ZERO {
        return None;
    }
    let available = settings.admission_capacity
        * (state_of_charge - settings.min_soc).to_proportion()
        * DISCHARGE_ALLOWANCE;
    Some((available / average_quarter_energy).round_ties_even().max(0.0) as usize)
}

/// Whether the quarter at the rank may discharge within the budget.
#[must_use]
pub fn is_admitted(rank: usize, budget: Option<usize>) -> bool {
    budget.is_some_and(|budget| rank <= budget)
}
