pub mod fixed;
pub mod openweather;

use async_trait::async_trait;
use sprout_core::WeatherSnapshot;

pub use fixed::FixedWeather;
pub use openweather::OpenWeather;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("No location provided to fetch weather.")]
    NoLocation,

    #[error("Geocoding API Error: {0}.")]
    Geocoding(String),

    #[error("Could not find coordinates for \"{0}\". Please try a different location.")]
    LocationNotFound(String),

    #[error("Failed to connect to the geocoding service.")]
    GeocodingUnreachable(#[source] reqwest::Error),

    #[error("{0}")]
    Forecast(String),

    #[error("Failed to connect to the weather service.")]
    ForecastUnreachable(#[source] reqwest::Error),
}

/// Source of weather snapshots for a named location.
#[async_trait]
pub trait WeatherSource: Send + Sync + 'static {
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError>;
}
