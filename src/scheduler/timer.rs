use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

use chrono::{DateTime, Local};

use crate::scheduler::action::Action;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub u64);

pub trait Timers {
    fn schedule(&mut self, at: DateTime<Local>, action: Action) -> TimerHandle;

    /// Cancelling a fired or unknown timer does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Min-heap of the pending actions.
///
/// Timers with the same due time fire in the scheduling order.
/// Cancelled timers stay in the heap until they surface.
#[derive(Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(DateTime<Local>, TimerHandle)>>,
    actions: HashMap<TimerHandle, Action>,
    next_handle: u64,
}

impl Timers for TimerQueue {
    fn schedule(&mut self, at: DateTime<Local>, action: Action) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.heap.push(Reverse((at, handle)));
        self.actions.insert(handle, action);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.actions.remove(&handle);
    }
}

impl TimerQueue {
    /// Due time of the earliest pending timer.
    pub fn next_due(&mut self) -> Option<DateTime<Local>> {
        self.skip_cancelled();
        self.heap.peek().map(|Reverse((at, _))| *at)
    }

    /// Take the earliest timer which is due at the moment.
    pub fn pop_due(&mut self, now: DateTime<Local>) -> Option<(TimerHandle, Action)> {
        self.skip_cancelled();
        let Reverse((at, handle)) = *self.heap.peek()?;
        if at > now {
            return None;
        }
        self.heap.pop();
        self.actions.remove(&handle).map(|action| (handle, action))
    }

    /// Pending timers in the firing order.
    #[cfg(test)]
    pub fn pending(&self) -> Vec<(DateTime<Local>, Action)> {
        let mut pending = self
            .heap
            .iter()
            .filter_map(|Reverse((at, handle))| {
                self.actions.get(handle).map(|action| ((*at, *handle), *action))
            })
            .collect::<Vec<_>>();
        pending.sort_by_key(|(key, _)| *key);
        pending.into_iter().map(|((at, _), action)| (at, action)).collect()
    }

    fn skip_cancelled(&mut self) {
        while let Some(Reverse((_, handle))) = self.heap.peek() {
            if self.actions.contains_key(handle) {
                break;
            }
            self.heap.pop();
        }
    }
}
