use serde::Serialize;
use sprout_core::{
    BoxStr, MoistureCategory, Recommendation, SensorReading, WeatherSnapshot,
};

use crate::config::SessionConfig;
use crate::debounce::TransitionTimer;
use crate::pump::PumpView;
use crate::scheduler::ArmedTimers;
use crate::sensor::{DeviceLink, SensorMode};

/// Operator session. Authentication happens upstream; the control loop only
/// sees the gate.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authenticated: bool,
    pub location: Option<String>,
    pub crop: Option<String>,
    pub automation: bool,
    pub auto_refresh: bool,
}

impl Session {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            authenticated: false,
            location: normalize(config.location.as_deref()),
            crop: normalize(config.crop.as_deref()),
            automation: config.automation,
            auto_refresh: config.auto_refresh,
        }
    }
}

/// Trimmed value, or `None` when blank.
pub fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Last advisory message for the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: BoxStr,
    pub at: jiff::Timestamp,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<BoxStr>) -> Self {
        Self {
            level,
            message: message.into(),
            at: jiff::Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceView {
    pub mode: SensorMode,
    pub addr: Option<BoxStr>,
    pub connected: bool,
    pub connecting: bool,
    pub error: Option<BoxStr>,
}

impl DeviceView {
    pub fn new(link: &DeviceLink, connecting: bool) -> Self {
        Self {
            mode: link.mode(),
            addr: link.addr().map(Into::into),
            connected: link.is_connected(),
            connecting,
            error: link.error().map(Into::into),
        }
    }
}

/// Everything the dashboard shows, published after every loop iteration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub authenticated: bool,
    pub location: Option<BoxStr>,
    pub crop: Option<BoxStr>,
    pub automation: bool,
    pub auto_refresh: bool,
    pub reading: SensorReading,
    pub category: MoistureCategory,
    pub pump: PumpView,
    pub recommendation: Recommendation,
    pub weather: Option<WeatherSnapshot>,
    pub weather_error: Option<BoxStr>,
    pub device: DeviceView,
    pub transition: Option<TransitionTimer>,
    pub loading: bool,
    pub refresh_in_flight: bool,
    pub timers: ArmedTimers,
    pub notice: Option<Notice>,
    /// Served separately by the history endpoint.
    #[serde(skip)]
    pub history: Vec<SensorReading>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_settings_are_dropped() {
        assert_eq!(normalize(Some("  ")), None);
        assert_eq!(normalize(Some(" rice ")).as_deref(), Some("rice"));
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn session_starts_unauthenticated() {
        let session = Session::from_config(&SessionConfig {
            auto_start: true,
            location: Some("Bogura".into()),
            crop: Some("".into()),
            automation: true,
            auto_refresh: false,
        });
        assert!(!session.authenticated);
        assert_eq!(session.location.as_deref(), Some("Bogura"));
        assert_eq!(session.crop, None);
        assert!(session.automation);
    }
}
