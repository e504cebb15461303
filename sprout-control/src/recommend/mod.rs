//! Irrigation recommendation providers.
//!
//! Providers never fail outward: a provider that cannot reach a verdict returns
//! a [`Recommendation`] with [`Decision::Error`](sprout_core::Decision::Error)
//! and a human-readable reason, so the control loop keeps running.

pub mod http;
pub mod rules;

use async_trait::async_trait;
use sprout_core::{Recommendation, SensorReading, WeatherSnapshot};

pub use http::HttpRecommender;
pub use rules::RuleBasedRecommender;

#[async_trait]
pub trait RecommendationProvider: Send + Sync + 'static {
    async fn recommend(
        &self,
        reading: &SensorReading,
        weather: &WeatherSnapshot,
        crop: Option<&str>,
    ) -> Recommendation;
}

/// Reading handed to the provider: soil moisture from the sensor, air
/// conditions from current weather when it is known.
pub fn provider_reading(reading: &SensorReading, weather: &WeatherSnapshot) -> SensorReading {
    SensorReading {
        soil_moisture: reading.soil_moisture,
        temperature: weather
            .current
            .map(|c| c.temperature)
            .unwrap_or(reading.temperature),
        humidity: weather
            .current
            .map(|c| f64::from(c.humidity))
            .unwrap_or(reading.humidity),
    }
}

/// Trimmed crop label, or `None` when blank.
pub fn crop_label(crop: Option<&str>) -> Option<&str> {
    crop.map(str::trim).filter(|c| !c.is_empty())
}
