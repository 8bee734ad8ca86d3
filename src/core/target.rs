use std::cmp::Reverse;

use bon::Builder;
use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    core::{
        interval::Interval,
        plan::ChargeWindow,
        quarter::{QUARTER, Quarter},
        season::is_winter,
        settings::Settings,
    },
    prelude::*,
    quantity::{energy::WattHours, percent::Percent, power::Watts, price::Price},
};

/// Always charge at least this much when the night is cheap.
const CHEAP_NIGHT_SOC: Percent = Percent(80.0);

/// Always charge at least this much otherwise.
const EXPENSIVE_NIGHT_SOC: Percent = Percent(30.0);

/// Outside winter, the next day's sun fills up the rest.
const NON_WINTER_MAX_SOC: Percent = Percent(80.0);

const POWER_STEP: Watts = Watts(100.0);

const POWER_FACTOR: f64 = 1.1;

/// Applied once the expensive quarters get dropped.
const TRIMMED_POWER_FACTOR: f64 = 1.15;

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeTarget {
    pub state_of_charge: Percent,
    pub power: Watts,

    /// Sorted by start, non-empty.
    pub windows: Vec<ChargeWindow>,

    /// Highest price among the charged quarters.
    pub high_price: Price,
}

impl ChargeTarget {
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.state_of_charge >= Percent::HUNDRED
    }
}

#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct ChargeCalculator<'a> {
    settings: &'a Settings,
    charge_quarters: &'a [Quarter],
    n_discharge_quarters: usize,
    average_quarter_energy: WattHours,
    state_of_charge: Percent,

    /// Whether the battery is due for a full charge.
    is_balancing: bool,

    date: NaiveDate,
}

impl<S: charge_calculator_builder::IsComplete> ChargeCalculatorBuilder<'_, S> {
    /// Returns [`None`] when no charging is needed.
    pub fn calculate(self) -> Option<ChargeTarget> {
        self.build().calculate()
    }
}

impl ChargeCalculator<'_> {
    #[instrument(
        skip_all,
        name = "Calculating the charge target…",
        fields(
            n_charge_quarters = self.charge_quarters.len(),
            n_discharge_quarters = self.n_discharge_quarters,
        ),
    )]
    fn calculate(self) -> Option<ChargeTarget> {
        if self.charge_quarters.is_empty() {
            return None;
        }
        let target_soc = self.target_soc();
        let required = self.settings.capacity * (target_soc - self.state_of_charge).to_proportion();
        info!(?target_soc, current_soc = ?self.state_of_charge, ?required);
        if required <= WattHours::ZERO {
            info!("no need to charge");
            return None;
        }

        let mut quarters = self
            .charge_quarters
            .iter()
            .copied()
            .sorted_by_key(|quarter| quarter.start)
            .collect_vec();
        let mut power = Self::power(required, quarters.len(), POWER_FACTOR);
        while quarters.len() > 1 && power < self.settings.min_charging_power {
            let Some(index) =
                quarters.iter().position_min_by_key(|quarter| Reverse(quarter.price))
            else {
                break;
            };
            let dropped = quarters.remove(index);
            power = Self::power(required, quarters.len(), TRIMMED_POWER_FACTOR);
            debug!(
                price = ?dropped.price,
                start = ?dropped.start,
                ?power,
                "dropped the most expensive quarter",
            );
        }
        let power = power.min(self.settings.max_charging_power);

        let high_price = quarters.iter().map(|quarter| quarter.price).max()?;
        let windows = quarters
            .iter()
            .map(|quarter| quarter.interval())
            .coalesce(|lhs, rhs| {
                if rhs.start == lhs.end {
                    Ok(Interval::new(lhs.start, rhs.end))
                } else {
                    Err((lhs, rhs))
                }
            })
            .map(|interval| ChargeWindow {
                start: interval.start,
                end: interval.end,
                target_soc,
                power,
            })
            .collect_vec();
        info!(?power, n_windows = windows.len(), ?high_price, "calculated");
        Some(ChargeTarget { state_of_charge: target_soc, power, windows, high_price })
    }

    #[expect(clippy::cast_precision_loss)]
    fn target_soc(&self) -> Percent {
        let mut target_soc = Percent(0.0);
        if self.n_discharge_quarters != 0 {
            let required = self.average_quarter_energy * self.n_discharge_quarters as f64;
            let needed = (self.settings.min_residual_energy() + required) / self.settings.capacity;
            target_soc = Percent((needed * 100.0).ceil()).min(Percent::HUNDRED);
            if target_soc >= Percent::HUNDRED {
                target_soc = if self.is_balancing { Percent::HUNDRED } else { Percent(99.0) };
            }
        }

        let mean_price = self.charge_quarters.iter().map(|quarter| quarter.price).sum::<Price>()
            / self.charge_quarters.len() as f64;
        target_soc = target_soc.max(if mean_price < self.settings.cheap_price {
            CHEAP_NIGHT_SOC
        } else {
            EXPENSIVE_NIGHT_SOC
        });

        if !is_winter(self.date) {
            target_soc = target_soc.min(NON_WINTER_MAX_SOC);
        }
        target_soc
    }

    /// Power needed to charge the energy during the quarters, rounded up to the inverter step.
    #[expect(clippy::cast_precision_loss)]
    fn power(required: WattHours, n_quarters: usize, factor: f64) -> Watts {
        (required / QUARTER / n_quarters as f64 * factor).ceil_to(POWER_STEP)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeDelta, TimeZone};

    use super::*;

    const WINTER: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    const AUTUMN: NaiveDate = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();

    fn night(prices: &[f64]) -> Vec<Quarter> {
        let start = Local.with_ymd_and_hms(2025, 1, 15, 22, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(index, price)| {
                Quarter::new(start + QUARTER * i32::try_from(index).unwrap(), Price(*price))
            })
            .collect()
    }

    fn calculate(
        charge_quarters: &[Quarter],
        n_discharge_quarters: usize,
        state_of_charge: f64,
        is_balancing: bool,
        date: NaiveDate,
    ) -> Option<ChargeTarget> {
        ChargeCalculator::builder()
            .settings(&Settings::default())
            .charge_quarters(charge_quarters)
            .n_discharge_quarters(n_discharge_quarters)
            .average_quarter_energy(WattHours(500.0))
            .state_of_charge(Percent(state_of_charge))
            .is_balancing(is_balancing)
            .date(date)
            .calculate()
    }

    #[test]
    fn test_cheap_night_floor() {
        let quarters = night(&[50.0; 16]);
        let target = calculate(&quarters, 20, 10.0, false, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(80.0));
    }

    #[test]
    fn test_winter_target() {
        let quarters = night(&[50.0; 16]);
        let target = calculate(&quarters, 40, 10.0, false, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(89.0));
        let target = calculate(&quarters, 40, 10.0, false, AUTUMN).unwrap();
        assert_eq!(target.state_of_charge, Percent(80.0));
    }

    #[test]
    fn test_full_charge_only_when_balancing() {
        let quarters = night(&[50.0; 16]);
        let target = calculate(&quarters, 60, 10.0, false, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(99.0));
        assert!(!target.is_full());
        let target = calculate(&quarters, 60, 10.0, true, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(100.0));
        assert!(target.is_full());
    }

    #[test]
    fn test_expensive_night_floor() {
        let quarters = night(&[150.0; 16]);
        let target = calculate(&quarters, 0, 10.0, false, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(30.0));
    }

    #[test]
    fn test_target_is_monotonic_and_capped() {
        let quarters = night(&[150.0; 16]);
        let mut previous = Percent(0.0);
        for n_discharge_quarters in 0..=100 {
            let target = calculate(&quarters, n_discharge_quarters, 0.0, false, WINTER).unwrap();
            assert!(target.state_of_charge >= previous);
            assert!(target.state_of_charge <= Percent(99.0));
            previous = target.state_of_charge;
        }
    }

    #[test]
    fn test_no_charging_needed() {
        let quarters = night(&[50.0; 16]);
        assert_eq!(calculate(&quarters, 20, 85.0, false, WINTER), None);
        assert_eq!(calculate(&quarters, 20, 80.0, false, WINTER), None);
        assert_eq!(calculate(&[], 20, 10.0, false, WINTER), None);
    }

    #[test]
    fn test_power_single_window() {
        // 80% from 30% is 12800 Wh over 4 hours.
        let quarters = night(&[50.0; 16]);
        let target = calculate(&quarters, 20, 30.0, false, WINTER).unwrap();
        assert_eq!(target.power, Watts(3600.0));
        assert_eq!(target.windows.len(), 1);
        assert_eq!(target.windows[0].start, quarters[0].start);
        assert_eq!(target.windows[0].end, quarters[15].end());
        assert_eq!(target.windows[0].target_soc, Percent(80.0));
        assert_eq!(target.high_price, Price(50.0));
    }

    #[test]
    fn test_power_is_capped() {
        let quarters = night(&[50.0; 2]);
        let target = calculate(&quarters, 20, 10.0, false, WINTER).unwrap();
        assert_eq!(target.power, Settings::default().max_charging_power);
    }

    #[test]
    fn test_trimming_expensive_quarters() {
        let quarters = night(&[10.0, 80.0, 20.0, 70.0, 30.0, 60.0, 40.0, 50.0]);
        let target = calculate(&quarters, 0, 77.0, false, WINTER).unwrap();
        assert_eq!(target.state_of_charge, Percent(80.0));
        assert_eq!(target.power, Watts(800.0));
        assert_eq!(target.high_price, Price(50.0));
        let windows = target.windows.iter().map(|window| (window.start, window.end)).collect_vec();
        assert_eq!(
            windows,
            [
                (quarters[0].start, quarters[0].end()),
                (quarters[2].start, quarters[2].end()),
                (quarters[4].start, quarters[4].end()),
                (quarters[6].start, quarters[7].end()),
            ]
        );
    }

    #[test]
    fn test_trimming_stops_at_single_quarter() {
        let quarters = night(&[10.0, 20.0, 30.0]);
        let target = calculate(&quarters, 0, 79.5, false, WINTER).unwrap();
        assert_eq!(target.windows.len(), 1);
        assert_eq!(target.windows[0].start, quarters[0].start);
        assert_eq!(target.windows[0].end - target.windows[0].start, TimeDelta::minutes(15));
        assert!(target.power < Settings::default().min_charging_power);
    }
}
