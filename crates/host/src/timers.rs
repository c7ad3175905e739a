//! Virtual-clock timers backing `setTimeout` / `setInterval`.
//!
//! Time only moves when the embedder advances it, which keeps timer-driven
//! behaviors deterministic. Timers due at the same instant fire in creation order.

use crate::page::Page;
use core::ops::ControlFlow;
use core::time::Duration;
use std::rc::Rc;

/// Browsers clamp interval periods; a zero period would never let time advance.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a scheduled timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Callback of a repeating timer; `ControlFlow::Break` stops the interval.
pub type IntervalCallback = Rc<dyn Fn(&Page) -> ControlFlow<()>>;

/// Work attached to a timer.
pub enum TimerTask {
    Once(Box<dyn FnOnce(&Page)>),
    Repeat {
        period: Duration,
        callback: IntervalCallback,
    },
}

struct TimerEntry {
    id: TimerId,
    due: Duration,
    task: TimerTask,
}

/// A timer that has come due and been taken out of the queue.
pub struct DueTimer {
    pub id: TimerId,
    pub due: Duration,
    pub task: TimerTask,
}

#[derive(Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    /// Current virtual time since page start.
    pub const fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule_once(&mut self, delay: Duration, callback: Box<dyn FnOnce(&Page)>) -> TimerId {
        let due = self.now.saturating_add(delay);
        self.insert(due, TimerTask::Once(callback))
    }

    pub fn schedule_repeat(&mut self, period: Duration, callback: IntervalCallback) -> TimerId {
        let period = period.max(MIN_INTERVAL);
        let due = self.now.saturating_add(period);
        self.insert(due, TimerTask::Repeat { period, callback })
    }

    fn insert(&mut self, due: Duration, task: TimerTask) -> TimerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = TimerId(self.next_id);
        self.entries.push(TimerEntry { id, due, task });
        id
    }

    /// Cancel a timer. Returns false when it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Number of scheduled timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Take the earliest timer due at or before `limit`, moving the clock to its due time.
    pub fn pop_due(&mut self, limit: Duration) -> Option<DueTimer> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= limit)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(index, _)| index)?;
        let entry = self.entries.swap_remove(index);
        self.now = self.now.max(entry.due);
        Some(DueTimer {
            id: entry.id,
            due: entry.due,
            task: entry.task,
        })
    }

    /// Put a repeating timer back for its next period, keeping its id.
    pub fn reschedule(&mut self, id: TimerId, due: Duration, period: Duration, callback: IntervalCallback) {
        self.entries.push(TimerEntry {
            id,
            due,
            task: TimerTask::Repeat { period, callback },
        });
    }

    /// Move the clock forward (never backwards).
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
