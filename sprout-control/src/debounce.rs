//! Debounced reaction to moisture regime changes.
//!
//! ```text
//!              Dry <-> Optimal                     remaining == 0
//!   Idle ───────────────────────► Counting ────────────────────────► Fire
//!    ▲                              │  │                               │
//!    │   other change / reset       │  │ Dry <-> Optimal (restart)     │
//!    └──────────────────────────────┘  └──► Counting                   │
//!    └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The debouncer only keeps bookkeeping. The owner arms a one-second ticker
//! when [`DebounceEvent::Started`] is returned and drops it on
//! [`DebounceEvent::Cancelled`] or [`DebounceEvent::Fire`].

use serde::Serialize;
use sprout_core::MoistureCategory;

/// An active countdown. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionTimer {
    /// Category the countdown is waiting to confirm (Dry or Optimal).
    pub target_category: MoistureCategory,
    pub remaining_secs: u32,
    /// Category observed when the countdown started.
    pub started_for_category: MoistureCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceEvent {
    /// Nothing changed.
    Idle,
    /// A new countdown replaced any previous one.
    Started(TransitionTimer),
    /// A pending countdown was dropped without firing.
    Cancelled,
    /// Countdown still running with this many seconds left.
    Counting(u32),
    /// Countdown completed; issue one cached-weather refresh.
    Fire,
}

#[derive(Debug, Clone)]
pub struct TransitionDebouncer {
    last_seen: Option<MoistureCategory>,
    timer: Option<TransitionTimer>,
    countdown_secs: u32,
}

fn is_relevant(from: MoistureCategory, to: MoistureCategory) -> bool {
    matches!(
        (from, to),
        (MoistureCategory::Dry, MoistureCategory::Optimal)
            | (MoistureCategory::Optimal, MoistureCategory::Dry)
    )
}

impl TransitionDebouncer {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            last_seen: None,
            timer: None,
            countdown_secs: countdown_secs.max(1),
        }
    }

    pub fn timer(&self) -> Option<&TransitionTimer> {
        self.timer.as_ref()
    }

    pub fn is_counting(&self) -> bool {
        self.timer.is_some()
    }

    /// Feed the latest classification. Repeats of the last category are ignored.
    pub fn observe(&mut self, category: MoistureCategory) -> DebounceEvent {
        let prev = self.last_seen.replace(category);
        let Some(prev) = prev else {
            return DebounceEvent::Idle;
        };
        if prev == category {
            return DebounceEvent::Idle;
        }

        if is_relevant(prev, category) {
            let timer = TransitionTimer {
                target_category: category,
                remaining_secs: self.countdown_secs,
                started_for_category: category,
            };
            self.timer = Some(timer);
            return DebounceEvent::Started(timer);
        }

        self.cancel()
    }

    /// Advance the countdown by one second against the live category.
    pub fn tick(&mut self, live: MoistureCategory) -> DebounceEvent {
        let Some(timer) = self.timer.as_mut() else {
            return DebounceEvent::Idle;
        };

        if live != timer.started_for_category || self.last_seen != Some(timer.target_category) {
            self.timer = None;
            return DebounceEvent::Cancelled;
        }

        timer.remaining_secs = timer.remaining_secs.saturating_sub(1);
        if timer.remaining_secs == 0 {
            self.timer = None;
            return DebounceEvent::Fire;
        }

        DebounceEvent::Counting(timer.remaining_secs)
    }

    /// Drop any countdown and resynchronise with `current`. Used when the
    /// auto-refresh feature is off or the session ends.
    pub fn reset(&mut self, current: MoistureCategory) -> DebounceEvent {
        self.last_seen = Some(current);
        self.cancel()
    }

    fn cancel(&mut self) -> DebounceEvent {
        match self.timer.take() {
            Some(_) => DebounceEvent::Cancelled,
            None => DebounceEvent::Idle,
        }
    }
}
