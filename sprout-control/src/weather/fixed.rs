use async_trait::async_trait;
use sprout_core::{CurrentWeather, WeatherDay, WeatherOrigin, WeatherSnapshot};

use super::{WeatherError, WeatherSource};

/// Offline weather source returning the same dry three-day forecast every time.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedWeather;

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        if location.trim().is_empty() {
            return Err(WeatherError::NoLocation);
        }

        let today = jiff::Zoned::now().date();
        let forecast = [("Today", 0, 29.0, 10), ("Tomorrow", 1, 30.5, 20), ("", 2, 28.0, 35)]
            .into_iter()
            .map(|(label, offset, temp, rain_chance)| {
                let date = today.saturating_add(jiff::Span::new().days(offset));
                let day = if label.is_empty() {
                    date.strftime("%A").to_string()
                } else {
                    label.to_string()
                };
                WeatherDay {
                    day: day.into(),
                    date: date.to_string().into(),
                    temp,
                    humidity: 62,
                    rain_chance,
                    description: "Clouds".into(),
                }
            })
            .collect();

        Ok(WeatherSnapshot {
            forecast,
            current: Some(CurrentWeather {
                temperature: 29.0,
                humidity: 62,
            }),
            resolved_location: Some(location.into()),
            lat: None,
            lon: None,
            source: WeatherOrigin::Mock,
            fetched_at: jiff::Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_forecast_is_usable() {
        let snapshot = FixedWeather.fetch("Bogura, Bangladesh").await.unwrap();
        assert!(snapshot.is_usable());
        assert_eq!(snapshot.forecast.len(), 3);
        assert_eq!(&*snapshot.forecast[0].day, "Today");
        assert_eq!(snapshot.source, WeatherOrigin::Mock);
    }

    #[tokio::test]
    async fn blank_location_is_rejected() {
        assert!(matches!(
            FixedWeather.fetch("  ").await,
            Err(WeatherError::NoLocation)
        ));
    }
}
