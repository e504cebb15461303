use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::civil::Date;
use serde::Deserialize;
use sprout_core::{CurrentWeather, WeatherDay, WeatherOrigin, WeatherSnapshot};
use tracing::{debug, instrument};

use super::{WeatherError, WeatherSource};

/// Number of forecast days kept from the 3-hourly feed.
const FORECAST_DAYS: usize = 5;

/// OpenWeatherMap client: geocoding, current conditions and the 5-day forecast.
pub struct OpenWeather {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeather {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: f64,
    lon: f64,
    name: String,
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastItem {
    dt_txt: String,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[async_trait]
impl WeatherSource for OpenWeather {
    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        if location.trim().is_empty() {
            return Err(WeatherError::NoLocation);
        }

        let hit = self.geocode(location).await?;
        let resolved_location = [Some(hit.name.as_str()), hit.state.as_deref(), Some(hit.country.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        debug!(%resolved_location, lat = hit.lat, lon = hit.lon, "Resolved location");

        let coords = [
            ("lat", hit.lat.to_string()),
            ("lon", hit.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];

        let (current, forecast) = tokio::join!(
            self.http
                .get(format!("{}/data/2.5/weather", self.base_url))
                .query(&coords)
                .send(),
            self.http
                .get(format!("{}/data/2.5/forecast", self.base_url))
                .query(&coords)
                .send(),
        );
        let current = current.map_err(WeatherError::ForecastUnreachable)?;
        let forecast = forecast.map_err(WeatherError::ForecastUnreachable)?;

        if !current.status().is_success() || !forecast.status().is_success() {
            let mut message = String::new();
            if !current.status().is_success() {
                message.push_str(&format!(
                    "Current weather error: {}. ",
                    reason(current.status())
                ));
            }
            if !forecast.status().is_success() {
                message.push_str(&format!("Forecast error: {}.", reason(forecast.status())));
            }
            return Err(WeatherError::Forecast(message.trim().to_string()));
        }

        let current: CurrentResponse = current
            .json()
            .await
            .map_err(WeatherError::ForecastUnreachable)?;
        let forecast: ForecastResponse = forecast
            .json()
            .await
            .map_err(WeatherError::ForecastUnreachable)?;

        Ok(WeatherSnapshot {
            forecast: aggregate_forecast(&forecast.list, jiff::Zoned::now().date()).into(),
            current: Some(CurrentWeather {
                temperature: round1(current.main.temp),
                humidity: current.main.humidity.round().clamp(0.0, 100.0) as u8,
            }),
            resolved_location: Some(resolved_location.into()),
            lat: Some(hit.lat),
            lon: Some(hit.lon),
            source: WeatherOrigin::Live,
            fetched_at: jiff::Timestamp::now(),
        })
    }
}

impl OpenWeather {
    async fn geocode(&self, location: &str) -> Result<GeocodeHit, WeatherError> {
        let resp = self
            .http
            .get(format!("{}/geo/1.0/direct", self.base_url))
            .query(&[("q", location), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(WeatherError::GeocodingUnreachable)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ApiMessage>()
                .await
                .ok()
                .and_then(|body| body.message)
                .map(|m| capitalize(&m))
                .unwrap_or_else(|| reason(status));
            return Err(WeatherError::Geocoding(message));
        }

        let hits: Vec<GeocodeHit> = resp
            .json()
            .await
            .map_err(WeatherError::GeocodingUnreachable)?;
        hits.into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(location.to_string()))
    }
}

/// Collapse 3-hourly forecast items into at most five per-day summaries.
pub(crate) fn aggregate_forecast(items: &[ForecastItem], today: Date) -> Vec<WeatherDay> {
    let mut by_date: BTreeMap<&str, Vec<&ForecastItem>> = BTreeMap::new();
    for item in items {
        let date = item.dt_txt.split(' ').next().unwrap_or_default();
        by_date.entry(date).or_default().push(item);
    }

    by_date
        .into_iter()
        .filter(|(_, day_items)| !day_items.is_empty())
        .take(FORECAST_DAYS)
        .map(|(date, day_items)| {
            let count = day_items.len() as f64;
            let avg_temp = day_items.iter().map(|i| i.main.temp).sum::<f64>() / count;
            let avg_humidity = day_items.iter().map(|i| i.main.humidity).sum::<f64>() / count;
            let max_pop = day_items.iter().map(|i| i.pop).fold(0.0_f64, f64::max);
            let description = day_items[day_items.len() / 2]
                .weather
                .first()
                .map(|c| c.main.as_str())
                .unwrap_or("Unknown");

            WeatherDay {
                day: day_label(date, today).into(),
                date: date.into(),
                temp: round1(avg_temp),
                humidity: avg_humidity.round().clamp(0.0, 100.0) as u8,
                rain_chance: (max_pop * 100.0).round().clamp(0.0, 100.0) as u8,
                description: description.into(),
            }
        })
        .collect()
}

fn day_label(date: &str, today: Date) -> String {
    let Ok(parsed) = date.parse::<Date>() else {
        return date.to_string();
    };

    match today.until(parsed).map(|span| span.get_days()) {
        Ok(0) => "Today".to_string(),
        Ok(1) => "Tomorrow".to_string(),
        _ => parsed.strftime("%A").to_string(),
    }
}

fn reason(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(dt_txt: &str, temp: f64, humidity: f64, pop: f64, main: &str) -> ForecastItem {
        ForecastItem {
            dt_txt: dt_txt.to_string(),
            main: MainBlock { temp, humidity },
            weather: vec![Condition {
                main: main.to_string(),
            }],
            pop,
        }
    }

    #[test]
    fn groups_items_by_day() {
        let today: Date = "2025-06-02".parse().unwrap();
        let items = vec![
            item("2025-06-02 09:00:00", 30.0, 70.0, 0.1, "Clear"),
            item("2025-06-02 12:00:00", 32.0, 65.0, 0.6, "Rain"),
            item("2025-06-02 15:00:00", 31.0, 66.0, 0.2, "Clouds"),
            item("2025-06-03 00:00:00", 25.0, 80.0, 0.0, "Clear"),
            item("2025-06-04 00:00:00", 24.0, 81.0, 0.05, "Clear"),
        ];

        let days = aggregate_forecast(&items, today);
        assert_eq!(days.len(), 3);

        assert_eq!(&*days[0].day, "Today");
        assert_eq!(&*days[0].date, "2025-06-02");
        assert_eq!(days[0].temp, 31.0);
        assert_eq!(days[0].humidity, 67);
        assert_eq!(days[0].rain_chance, 60);
        assert_eq!(&*days[0].description, "Rain");

        assert_eq!(&*days[1].day, "Tomorrow");
        assert_eq!(&*days[2].day, "Wednesday");
        assert_eq!(days[2].rain_chance, 5);
    }

    #[test]
    fn keeps_at_most_five_days() {
        let today: Date = "2025-06-01".parse().unwrap();
        let items: Vec<ForecastItem> = (1..=7)
            .map(|d| item(&format!("2025-06-0{d} 12:00:00"), 20.0, 50.0, 0.0, "Clear"))
            .collect();

        let days = aggregate_forecast(&items, today);
        assert_eq!(days.len(), 5);
        assert_eq!(&*days[4].date, "2025-06-05");
    }

    #[test]
    fn capitalizes_api_messages() {
        assert_eq!(capitalize("invalid API key"), "Invalid API key");
        assert_eq!(capitalize(""), "");
    }
}
