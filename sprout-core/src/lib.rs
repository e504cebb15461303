use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

// We use `Box<str>` and `Box<[T]>` for values that never grow after they are
// produced. Readings, recommendations and forecasts are replaced wholesale,
// never edited in place.
pub type BoxStr = Box<str>;
pub type BoxList<T> = Box<[T]>;

/// A single environmental sample, either simulated or reported by the field device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Volumetric soil moisture as a percentage (0–100).
    pub soil_moisture: f64,
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity as a percentage (0–100).
    pub humidity: f64,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            soil_moisture: 45.0,
            temperature: 22.0,
            humidity: 60.0,
        }
    }
}

/// Coarse soil-moisture regime derived from the latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoistureCategory {
    Dry,
    Optimal,
    Wet,
}

impl fmt::Display for MoistureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoistureCategory::Dry => f.write_str("Dry"),
            MoistureCategory::Optimal => f.write_str("Optimal"),
            MoistureCategory::Wet => f.write_str("Wet"),
        }
    }
}

/// Commanded or reported state of the irrigation pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PumpStatus {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpStatus::On => f.write_str("ON"),
            PumpStatus::Off => f.write_str("OFF"),
        }
    }
}

/// Recommendation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Irrigate,
    Hold,
    /// The provider could not produce a verdict. Never actionable.
    Error,
}

/// Latest irrigation recommendation. A new one fully replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    /// One-sentence explanation of the decision.
    pub reason: BoxStr,
    /// Short operator-facing message, usually referencing the crop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_message: Option<BoxStr>,
    /// Key factors behind the decision.
    #[serde(default)]
    pub analysis_points: BoxList<BoxStr>,
    /// Certainty in the decision, 0.0–1.0.
    #[serde(default, rename = "confidence_score", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Recommendation {
    /// Placeholder used before the first refresh completes.
    pub fn initial() -> Self {
        Self {
            decision: Decision::Hold,
            reason: "Initializing...".into(),
            short_message: None,
            analysis_points: Box::new([]),
            confidence: Some(0.0),
        }
    }

    pub fn hold(reason: impl Into<BoxStr>) -> Self {
        Self {
            decision: Decision::Hold,
            reason: reason.into(),
            short_message: None,
            analysis_points: Box::new([]),
            confidence: None,
        }
    }

    pub fn error(reason: impl Into<BoxStr>) -> Self {
        Self {
            decision: Decision::Error,
            reason: reason.into(),
            short_message: None,
            analysis_points: Box::new([]),
            confidence: None,
        }
    }
}

/// Where a weather snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherOrigin {
    Live,
    Mock,
}

/// Aggregated forecast for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDay {
    /// "Today", "Tomorrow" or a weekday name.
    pub day: BoxStr,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: BoxStr,
    /// Average temperature in degrees Celsius.
    pub temp: f64,
    /// Average relative humidity (%).
    pub humidity: u8,
    /// Highest probability of precipitation over the day (%).
    pub rain_chance: u8,
    pub description: BoxStr,
}

/// Current conditions at the resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub humidity: u8,
}

/// The most recent successful weather fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub forecast: BoxList<WeatherDay>,
    pub current: Option<CurrentWeather>,
    pub resolved_location: Option<BoxStr>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub source: WeatherOrigin,
    pub fetched_at: jiff::Timestamp,
}

impl WeatherSnapshot {
    /// A snapshot can feed a recommendation only if it carries a forecast.
    pub fn is_usable(&self) -> bool {
        !self.forecast.is_empty()
    }

    pub fn today(&self) -> Option<&WeatherDay> {
        self.forecast.first()
    }

    pub fn tomorrow(&self) -> Option<&WeatherDay> {
        self.forecast.get(1)
    }
}

/// Status payload returned by the field device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    /// Soil moisture measured by the device (%).
    pub moisture: f64,
    /// Absent on firmware that only reports moisture.
    #[serde(default)]
    pub pump_status: Option<PumpStatus>,
}

/// Body of a pump actuation request sent to the field device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpCommand {
    pub state: PumpStatus,
}

/// Unique identifier for an activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub BoxStr);

impl ActivityId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().into_boxed_str())
    }
}

/// An audit record of something the operator or the automation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub action: BoxStr,
    pub details: BoxStr,
    pub timestamp: jiff::Timestamp,
}
