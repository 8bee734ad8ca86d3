use bon::Builder;
use itertools::Itertools;

use crate::{
    core::{
        quarter::{QUARTER, Quarter, QuarterSeries},
        settings::Settings,
    },
    prelude::*,
    quantity::{energy::WattHours, percent::Percent, price::Price},
};

/// Night charge and next-day discharge quarters.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct NightPlan {
    /// Sorted by start.
    pub charge: Vec<Quarter>,

    /// Sorted by start.
    pub discharge: Vec<Quarter>,

    /// Winning charge price threshold, [`None`] for the fallback plan.
    pub max_charge_price: Option<Price>,

    pub n_estimated_discharge_quarters: usize,
}

/// Local search over the night prices treated as the maximal charge price.
#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct Optimizer<'a> {
    settings: &'a Settings,
    quarters: &'a QuarterSeries,
    average_quarter_energy: WattHours,
    state_of_charge: Percent,
}

impl<S: optimizer_builder::IsComplete> OptimizerBuilder<'_, S> {
    pub fn optimize(self) -> NightPlan {
        self.build().optimize()
    }
}

impl Optimizer<'_> {
    #[instrument(
        skip_all,
        name = "Optimizing the night plan…",
        fields(soc = ?self.state_of_charge, average_quarter_energy = ?self.average_quarter_energy),
    )]
    fn optimize(self) -> NightPlan {
        let night = self.quarters.night();
        let best = night
            .iter()
            .map(|quarter| quarter.price)
            .sorted()
            .dedup()
            .filter_map(|max_charge_price| self.evaluate(max_charge_price))
            .reduce(|best, next| if next.key() > best.key() { next } else { best });

        let cheap = night.iter().filter(|quarter| quarter.price < self.settings.cheap_price);
        let Some(best) = best else {
            warn!("no feasible candidate, charging the cheap quarters only");
            return NightPlan { charge: cheap.copied().collect(), ..NightPlan::default() };
        };
        info!(
            max_charge_price = ?best.max_charge_price,
            n_charge_quarters = best.charge.len(),
            n_discharge_quarters = best.discharge.len(),
            n_estimated_discharge_quarters = best.n_estimated_discharge_quarters,
            "optimized",
        );
        NightPlan {
            charge: best
                .charge
                .into_iter()
                .chain(cheap.copied())
                .sorted_by_key(|quarter| quarter.start)
                .dedup_by(|lhs, rhs| lhs.start == rhs.start)
                .collect(),
            discharge: best.discharge,
            max_charge_price: Some(best.max_charge_price),
            n_estimated_discharge_quarters: best.n_estimated_discharge_quarters,
        }
    }

    fn evaluate(&self, max_charge_price: Price) -> Option<Candidate> {
        let charge = self
            .quarters
            .night()
            .iter()
            .filter(|quarter| quarter.price <= max_charge_price)
            .copied()
            .collect_vec();
        if charge.is_empty() {
            return None;
        }
        let std_dev = std_dev(&charge);
        if std_dev > self.settings.max_std_dev {
            trace!(?max_charge_price, ?std_dev, "rejected: prices are too spread");
            return None;
        }

        let min_discharge_price = max_charge_price + self.settings.margin;
        let discharge = self
            .quarters
            .day()
            .iter()
            .filter(|quarter| quarter.price >= min_discharge_price)
            .copied()
            .collect_vec();
        if discharge.is_empty() {
            trace!(?max_charge_price, "rejected: nothing to discharge");
            return None;
        }

        let n_estimated_discharge_quarters =
            self.estimate_discharge_quarters(charge.len()).min(discharge.len());
        if n_estimated_discharge_quarters == 0 {
            trace!(?max_charge_price, "rejected: not enough energy to discharge");
            return None;
        }
        Some(Candidate { max_charge_price, charge, discharge, n_estimated_discharge_quarters })
    }

    /// Number of quarters the battery can cover after charging during `n_charge_quarters`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn estimate_discharge_quarters(&self, n_charge_quarters: usize) -> usize {
        if self.average_quarter_energy <= WattHours::ZERO {
            return 0;
        }
        let capacity = self.settings.capacity;
        let usable = (capacity * (self.state_of_charge - self.settings.min_soc).to_proportion())
            .max(WattHours::ZERO);
        let headroom = capacity * (1.0 - self.settings.min_soc.to_proportion()) - usable;
        let chargeable = (self.settings.max_charging_power * QUARTER * n_charge_quarters as f64)
            .min(headroom)
            .max(WattHours::ZERO);
        ((usable + chargeable) / self.average_quarter_energy).floor() as usize
    }
}

struct Candidate {
    max_charge_price: Price,
    charge: Vec<Quarter>,
    discharge: Vec<Quarter>,
    n_estimated_discharge_quarters: usize,
}

impl Candidate {
    const fn key(&self) -> (usize, usize) {
        (self.n_estimated_discharge_quarters, self.charge.len())
    }
}

/// Population standard deviation of the quarter prices.
#[expect(clippy::cast_precision_loss)]
fn std_dev(quarters: &[Quarter]) -> Price {
    let n = quarters.len() as f64;
    let mean = quarters.iter().map(|quarter| quarter.price.0).sum::<f64>() / n;
    let variance =
        quarters.iter().map(|quarter| (quarter.price.0 - mean).powi(2)).sum::<f64>() / n;
    Price(variance.sqrt())
}
