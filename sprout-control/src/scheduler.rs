//! Timers that drive recommendation refreshes, and the in-flight guard that
//! keeps the provider to one outstanding call.

use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::config::ScheduleConfig;

/// What asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshKind {
    /// Session started or location changed.
    Initial,
    /// Slow poll used while the heartbeat is off.
    Fallback,
    /// Fast poll on cached weather.
    Heartbeat,
    /// Periodic weather + recommendation refresh.
    Full,
    /// Debounced Dry/Optimal transition.
    Transition,
    /// Operator asked for it.
    Manual,
}

impl RefreshKind {
    pub fn uses_cached_weather(self) -> bool {
        matches!(self, RefreshKind::Heartbeat | RefreshKind::Transition)
    }

    pub fn shows_loading(self, heartbeat_enabled: bool) -> bool {
        match self {
            RefreshKind::Heartbeat | RefreshKind::Transition => false,
            RefreshKind::Full => !heartbeat_enabled,
            RefreshKind::Initial | RefreshKind::Fallback | RefreshKind::Manual => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulePeriods {
    pub fallback: Duration,
    pub heartbeat: Duration,
    pub full: Duration,
}

impl From<&ScheduleConfig> for SchedulePeriods {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            fallback: Duration::from_secs(config.fallback_secs.max(1)),
            heartbeat: Duration::from_secs(config.heartbeat_secs.max(1)),
            full: Duration::from_secs(config.full_refresh_secs.max(1)),
        }
    }
}

/// Which periodic timers are currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmedTimers {
    pub fallback: bool,
    pub heartbeat: bool,
    pub full: bool,
}

/// Owns the periodic refresh timers. A timer exists only while its gate is
/// open; closing the gate drops the [`Interval`].
#[derive(Debug)]
pub struct RefreshScheduler {
    periods: SchedulePeriods,
    authenticated: bool,
    initial_due: bool,
    fallback: Option<Interval>,
    heartbeat: Option<Interval>,
    full: Option<Interval>,
}

pub(crate) fn new_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

pub(crate) fn arm(slot: &mut Option<Interval>, enabled: bool, period: Duration) {
    match (enabled, slot.is_some()) {
        (true, false) => *slot = Some(new_interval(period)),
        (false, true) => *slot = None,
        _ => {}
    }
}

/// Tick an optional interval; pending forever when disarmed.
pub(crate) async fn tick_slot(slot: &mut Option<Interval>) -> Instant {
    match slot {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

impl RefreshScheduler {
    pub fn new(periods: SchedulePeriods) -> Self {
        Self {
            periods,
            authenticated: false,
            initial_due: false,
            fallback: None,
            heartbeat: None,
            full: None,
        }
    }

    /// Bring the timers in line with the current gates.
    pub fn sync(&mut self, authenticated: bool, auto_refresh: bool) {
        if authenticated && !self.authenticated {
            self.initial_due = true;
        }
        if !authenticated {
            self.initial_due = false;
        }
        self.authenticated = authenticated;

        arm(
            &mut self.fallback,
            authenticated && !auto_refresh,
            self.periods.fallback,
        );
        arm(
            &mut self.heartbeat,
            authenticated && auto_refresh,
            self.periods.heartbeat,
        );
        arm(&mut self.full, authenticated, self.periods.full);
    }

    /// Queue the initial fetch again after the location changed.
    pub fn location_changed(&mut self) {
        if self.authenticated {
            self.initial_due = true;
        }
    }

    pub fn armed(&self) -> ArmedTimers {
        ArmedTimers {
            fallback: self.fallback.is_some(),
            heartbeat: self.heartbeat.is_some(),
            full: self.full.is_some(),
        }
    }

    /// Wait for the next refresh. Cancel safe.
    pub async fn next(&mut self) -> RefreshKind {
        if std::mem::take(&mut self.initial_due) {
            return RefreshKind::Initial;
        }

        tokio::select! {
            _ = tick_slot(&mut self.fallback) => RefreshKind::Fallback,
            _ = tick_slot(&mut self.heartbeat) => RefreshKind::Heartbeat,
            _ = tick_slot(&mut self.full) => RefreshKind::Full,
        }
    }

    pub fn teardown(&mut self) {
        self.authenticated = false;
        self.initial_due = false;
        self.fallback = None;
        self.heartbeat = None;
        self.full = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// At most one outstanding recommendation request. A second request while one
/// is pending is refused, not queued.
#[derive(Debug, Default)]
pub struct InFlight {
    issued: u64,
    current: Option<(Ticket, Option<AbortHandle>)>,
}

impl InFlight {
    pub fn try_begin(&mut self) -> Option<Ticket> {
        if self.current.is_some() {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.current = Some((ticket, None));
        Some(ticket)
    }

    pub fn attach(&mut self, ticket: Ticket, handle: AbortHandle) {
        match &mut self.current {
            Some((current, slot)) if *current == ticket => *slot = Some(handle),
            _ => handle.abort(),
        }
    }

    /// Release the guard. Returns false for a ticket that was cancelled.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        match &self.current {
            Some((current, _)) if *current == ticket => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some((_, Some(handle))) = self.current.take() {
            handle.abort();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RefreshScheduler {
        RefreshScheduler::new(SchedulePeriods::from(&ScheduleConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_armed_before_authentication() {
        let mut scheduler = scheduler();
        scheduler.sync(false, true);
        assert_eq!(scheduler.armed(), ArmedTimers::default());

        let res = tokio::time::timeout(Duration::from_secs(3600), scheduler.next()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_and_full_without_heartbeat() {
        let mut scheduler = scheduler();
        let start = Instant::now();
        scheduler.sync(true, false);
        assert_eq!(
            scheduler.armed(),
            ArmedTimers {
                fallback: true,
                heartbeat: false,
                full: true
            }
        );

        assert_eq!(scheduler.next().await, RefreshKind::Initial);
        assert_eq!(scheduler.next().await, RefreshKind::Fallback);
        assert_eq!(start.elapsed(), Duration::from_secs(60));

        let mut kinds = Vec::new();
        while start.elapsed() <= Duration::from_secs(600) {
            kinds.push(scheduler.next().await);
        }
        assert_eq!(kinds.iter().filter(|k| **k == RefreshKind::Full).count(), 1);
        assert!(!kinds.contains(&RefreshKind::Heartbeat));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_swaps_fallback_for_heartbeat() {
        let mut scheduler = scheduler();
        scheduler.sync(true, false);
        assert_eq!(scheduler.next().await, RefreshKind::Initial);

        let start = Instant::now();
        scheduler.sync(true, true);
        assert!(!scheduler.armed().fallback);
        assert!(scheduler.armed().heartbeat);

        assert_eq!(scheduler.next().await, RefreshKind::Heartbeat);
        assert_eq!(start.elapsed(), Duration::from_secs(30));

        // Toggling does not queue another initial fetch.
        scheduler.sync(true, false);
        assert_eq!(scheduler.next().await, RefreshKind::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn location_change_requeues_initial_fetch() {
        let mut scheduler = scheduler();
        scheduler.location_changed();
        scheduler.sync(true, true);
        assert_eq!(scheduler.next().await, RefreshKind::Initial);

        scheduler.location_changed();
        assert_eq!(scheduler.next().await, RefreshKind::Initial);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_leaves_no_timers() {
        let mut scheduler = scheduler();
        scheduler.sync(true, true);
        scheduler.teardown();
        assert_eq!(scheduler.armed(), ArmedTimers::default());

        let res = tokio::time::timeout(Duration::from_secs(3600), scheduler.next()).await;
        assert!(res.is_err());
    }

    #[test]
    fn loading_rules() {
        assert!(RefreshKind::Full.shows_loading(false));
        assert!(!RefreshKind::Full.shows_loading(true));
        assert!(!RefreshKind::Heartbeat.shows_loading(false));
        assert!(RefreshKind::Initial.shows_loading(true));
        assert!(RefreshKind::Transition.uses_cached_weather());
        assert!(!RefreshKind::Fallback.uses_cached_weather());
    }

    #[tokio::test]
    async fn in_flight_refuses_second_request() {
        let mut guard = InFlight::default();
        let ticket = guard.try_begin().unwrap();
        assert!(guard.try_begin().is_none());
        assert!(guard.is_busy());

        assert!(guard.finish(ticket));
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }

    #[tokio::test]
    async fn cancelled_ticket_is_stale() {
        let mut guard = InFlight::default();
        let ticket = guard.try_begin().unwrap();
        let task = tokio::spawn(std::future::pending::<()>());
        guard.attach(ticket, task.abort_handle());

        guard.cancel();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!guard.finish(ticket));
    }
}
