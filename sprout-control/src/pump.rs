//! Hysteresis pump control with minimum dwell times.

use std::time::Duration;

use serde::Serialize;
use sprout_core::{Decision, MoistureCategory, PumpStatus};
use tokio::time::Instant;

use crate::config::ControlConfig;

#[derive(Debug, Clone, Copy)]
pub struct ControlParams {
    pub min_on: Duration,
    pub min_off: Duration,
    pub on_threshold: f64,
    pub off_threshold: f64,
    pub stable_window: Duration,
}

impl From<&ControlConfig> for ControlParams {
    fn from(config: &ControlConfig) -> Self {
        Self {
            min_on: Duration::from_secs(config.min_on_secs),
            min_off: Duration::from_secs(config.min_off_secs),
            on_threshold: config.on_threshold,
            off_threshold: config.off_threshold,
            stable_window: Duration::from_secs(config.stable_window_secs),
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self::from(&ControlConfig::default())
    }
}

/// Pump state kept as two slots. A successful command fills `commanded`; a
/// device report fills `observed`. Whichever arrived last wins.
#[derive(Debug, Clone)]
pub struct PumpState {
    commanded: Option<PumpStatus>,
    observed: Option<PumpStatus>,
    /// Start of the current dwell. Seeded with the startup instant, so the
    /// first switch also waits out its minimum.
    last_changed_at: Instant,
}

impl PumpState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            commanded: None,
            observed: None,
            last_changed_at: started_at,
        }
    }

    pub fn status(&self) -> PumpStatus {
        self.observed.or(self.commanded).unwrap_or(PumpStatus::Off)
    }

    pub fn commanded(&self) -> Option<PumpStatus> {
        self.commanded
    }

    pub fn observed(&self) -> Option<PumpStatus> {
        self.observed
    }

    pub fn last_changed_at(&self) -> Instant {
        self.last_changed_at
    }

    pub fn since_change(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_changed_at)
    }

    /// Record a successful command. Returns true if the effective state changed.
    pub fn apply_command(&mut self, status: PumpStatus, now: Instant) -> bool {
        let prev = self.status();
        self.commanded = Some(status);
        self.observed = None;
        self.mark(prev, now)
    }

    /// Record a device report. Returns true if the effective state changed.
    pub fn apply_observation(&mut self, status: PumpStatus, now: Instant) -> bool {
        let prev = self.status();
        self.observed = Some(status);
        self.commanded = None;
        self.mark(prev, now)
    }

    fn mark(&mut self, prev: PumpStatus, now: Instant) -> bool {
        let changed = prev != self.status();
        if changed {
            self.last_changed_at = now;
        }
        changed
    }
}

/// Tracks how long the moisture category has been continuously Optimal or Wet.
#[derive(Debug, Clone, Default)]
pub struct StabilityTracker {
    since: Option<Instant>,
}

impl StabilityTracker {
    pub fn track(&mut self, category: MoistureCategory, now: Instant) {
        match category {
            MoistureCategory::Optimal | MoistureCategory::Wet => {
                self.since.get_or_insert(now);
            }
            MoistureCategory::Dry => self.since = None,
        }
    }

    pub fn stable_for(&self, now: Instant) -> Duration {
        self.since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpView {
    pub status: PumpStatus,
    pub commanded: Option<PumpStatus>,
    pub observed: Option<PumpStatus>,
    pub secs_since_change: u64,
}

#[derive(Debug, Clone)]
pub struct PumpController {
    params: ControlParams,
    state: PumpState,
    stability: StabilityTracker,
}

impl PumpController {
    pub fn new(params: ControlParams, started_at: Instant) -> Self {
        Self {
            params,
            state: PumpState::new(started_at),
            stability: StabilityTracker::default(),
        }
    }

    pub fn status(&self) -> PumpStatus {
        self.state.status()
    }

    /// Must run before [`PumpController::decide`] within a tick.
    pub fn track_category(&mut self, category: MoistureCategory, now: Instant) {
        self.stability.track(category, now);
    }

    /// Command to issue this tick, if any. Does not change state: the caller
    /// applies the command once the device accepts it.
    pub fn decide(&self, moisture: f64, decision: Decision, now: Instant) -> Option<PumpStatus> {
        let elapsed = self.state.since_change(now);
        let dwelled = |min: Duration| elapsed >= min;

        match self.state.status() {
            PumpStatus::Off => {
                let wants_on =
                    decision == Decision::Irrigate && moisture <= self.params.on_threshold;
                (wants_on && dwelled(self.params.min_off)).then_some(PumpStatus::On)
            }
            PumpStatus::On => {
                let wants_off = decision == Decision::Hold
                    || moisture >= self.params.off_threshold
                    || self.stability.stable_for(now) >= self.params.stable_window;
                (wants_off && dwelled(self.params.min_on)).then_some(PumpStatus::Off)
            }
        }
    }

    pub fn apply_command(&mut self, status: PumpStatus, now: Instant) -> bool {
        self.state.apply_command(status, now)
    }

    pub fn apply_observation(&mut self, status: PumpStatus, now: Instant) -> bool {
        self.state.apply_observation(status, now)
    }

    pub fn view(&self, now: Instant) -> PumpView {
        PumpView {
            status: self.state.status(),
            commanded: self.state.commanded,
            observed: self.state.observed,
            secs_since_change: self.state.since_change(now).as_secs(),
        }
    }
}
