use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sprout_core::{Decision, Recommendation, SensorReading, WeatherSnapshot};
use tracing::{error, instrument};

use super::{RecommendationProvider, crop_label};

const FAILURE_REASON: &str = "Failed to contact AI.";

/// Remote recommendation service that accepts the sensor/weather/crop context as
/// JSON and answers with a recommendation object.
pub struct HttpRecommender {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct RecommendRequest<'a> {
    sensor: &'a SensorReading,
    weather: &'a WeatherSnapshot,
    crop: &'a str,
}

impl HttpRecommender {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key,
            timeout,
        }
    }

    async fn call(
        &self,
        reading: &SensorReading,
        weather: &WeatherSnapshot,
        crop: Option<&str>,
    ) -> Result<Recommendation, RecommendError> {
        let body = RecommendRequest {
            sensor: reading,
            weather,
            crop: crop_label(crop).unwrap_or("unspecified"),
        };

        let mut request = self.http.post(&self.url).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RecommendError::Status(status.as_u16()));
        }

        parse_recommendation(&text)
    }
}

#[derive(Debug, thiserror::Error)]
enum RecommendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider responded with status {0}")]
    Status(u16),
    #[error("malformed recommendation: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid decision {0:?}")]
    InvalidDecision(Decision),
}

/// Parse a provider answer, tolerating a fenced ```json block. Only Irrigate and
/// Hold are valid verdicts from a provider.
fn parse_recommendation(text: &str) -> Result<Recommendation, RecommendError> {
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let recommendation: Recommendation = serde_json::from_str(cleaned)?;
    match recommendation.decision {
        Decision::Irrigate | Decision::Hold => Ok(recommendation),
        other => Err(RecommendError::InvalidDecision(other)),
    }
}

#[async_trait]
impl RecommendationProvider for HttpRecommender {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn recommend(
        &self,
        reading: &SensorReading,
        weather: &WeatherSnapshot,
        crop: Option<&str>,
    ) -> Recommendation {
        match self.call(reading, weather, crop).await {
            Ok(recommendation) => recommendation,
            Err(e) => {
                error!(error = %e, "Error fetching irrigation decision");
                Recommendation::error(FAILURE_REASON)
            }
        }
    }
}
