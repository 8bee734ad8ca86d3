use std::collections::{HashMap, HashSet};

use enumset::{EnumSet, EnumSetType};

use crate::{
    core::plan::{ChargeWindow, DischargeQuarter},
    scheduler::timer::TimerHandle,
};

/// Deferred scheduler call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Plan the next night and day. The daily trigger has zero attempts.
    Plan { attempt: u32 },

    /// Look for the night charge which the latest plan has missed.
    MidDayCheck { attempt: u32 },

    StartCharge(ChargeWindow),
    StopCharge(ChargeWindow),
    StartDischarge(DischargeQuarter),
    StopDischarge,
}

impl Action {
    #[must_use]
    pub const fn category(self) -> TimerCategory {
        match self {
            Self::Plan { .. } | Self::MidDayCheck { .. } => TimerCategory::Planning,
            Self::StartCharge(_) | Self::StopCharge(_) => TimerCategory::Charge,
            Self::StartDischarge(_) => TimerCategory::Discharge,
            Self::StopDischarge => TimerCategory::StopDischarge,
        }
    }
}

#[derive(Debug, Hash, EnumSetType)]
pub enum TimerCategory {
    Planning,
    Charge,
    Discharge,
    StopDischarge,
}

/// Armed timer handles by category.
#[derive(Default)]
pub struct Handles(HashMap<TimerCategory, HashSet<TimerHandle>>);

impl Handles {
    pub fn insert(&mut self, category: TimerCategory, handle: TimerHandle) {
        self.0.entry(category).or_default().insert(handle);
    }

    /// Forget the fired handle.
    pub fn remove(&mut self, handle: TimerHandle) -> bool {
        self.0.values_mut().any(|handles| handles.remove(&handle))
    }

    /// Take all the handles of the categories, so that they can be cancelled.
    pub fn drain(&mut self, categories: EnumSet<TimerCategory>) -> Vec<TimerHandle> {
        categories
            .iter()
            .filter_map(|category| self.0.remove(&category))
            .flatten()
            .collect()
    }

    #[cfg(test)]
    #[must_use]
    pub fn count(&self, category: TimerCategory) -> usize {
        self.0.get(&category).map_or(0, HashSet::len)
    }
}
