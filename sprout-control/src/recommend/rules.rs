use async_trait::async_trait;
use sprout_core::{Decision, Recommendation, SensorReading, WeatherSnapshot};

use super::{RecommendationProvider, crop_label};

/// Rain probability above which irrigation is deferred.
const RAIN_LIKELY: u8 = 50;
/// Moisture below which plants are considered stressed regardless of crop.
const CRITICAL_MOISTURE: f64 = 35.0;

/// Water demand class of a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropBand {
    WaterLoving,
    Moderate,
    DroughtTolerant,
}

impl CropBand {
    pub fn for_crop(crop: Option<&str>) -> Self {
        let Some(crop) = crop else {
            return CropBand::Moderate;
        };
        let crop = crop.to_ascii_lowercase();
        if ["rice", "paddy", "taro", "jute"].iter().any(|c| crop.contains(c)) {
            CropBand::WaterLoving
        } else if ["millet", "sorghum", "chickpea", "lentil"]
            .iter()
            .any(|c| crop.contains(c))
        {
            CropBand::DroughtTolerant
        } else {
            CropBand::Moderate
        }
    }

    /// Moisture below which this crop should be irrigated when no rain is due.
    pub fn irrigate_below(self) -> f64 {
        match self {
            CropBand::WaterLoving => 50.0,
            CropBand::Moderate => 40.0,
            CropBand::DroughtTolerant => 38.0,
        }
    }
}

/// Deterministic agronomy rules: conserve water when rain is likely, relieve
/// stress when the soil is dry, and otherwise target the crop's moisture band.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedRecommender;

impl RuleBasedRecommender {
    pub fn decide(
        &self,
        reading: &SensorReading,
        weather: &WeatherSnapshot,
        crop: Option<&str>,
    ) -> Recommendation {
        let crop = crop_label(crop);
        let crop_name = crop.unwrap_or("the crop");
        let band = CropBand::for_crop(crop);
        let moisture = reading.soil_moisture;

        let rain_today = weather.today().map(|d| d.rain_chance).unwrap_or(0);
        let rain_tomorrow = weather.tomorrow().map(|d| d.rain_chance).unwrap_or(0);
        let rain = rain_today.max(rain_tomorrow);

        let points: Box<[Box<str>]> = Box::new([
            format!("Soil moisture is {moisture:.1}%.").into(),
            format!("Rain chance is {rain_today}% today and {rain_tomorrow}% tomorrow.").into(),
            format!(
                "Irrigation threshold for {crop_name} is {:.0}%.",
                band.irrigate_below()
            )
            .into(),
        ]);

        let (decision, reason, short_message, confidence) = if rain > RAIN_LIKELY {
            (
                Decision::Hold,
                format!("Rain is likely ({rain}% chance), so irrigation is deferred to conserve water."),
                format!("For {crop_name}, hold off because rain is expected soon."),
                0.85,
            )
        } else if moisture < CRITICAL_MOISTURE {
            (
                Decision::Irrigate,
                format!("Soil moisture of {moisture:.1}% is critically low and no significant rain is expected."),
                format!("For {crop_name}, irrigate now because the soil is too dry and no rain is expected."),
                0.9,
            )
        } else if moisture < band.irrigate_below() {
            (
                Decision::Irrigate,
                format!(
                    "Soil moisture of {moisture:.1}% is below the {:.0}% target for {crop_name}.",
                    band.irrigate_below()
                ),
                format!("For {crop_name}, irrigate now because moisture is below target and no rain is expected."),
                0.7,
            )
        } else {
            (
                Decision::Hold,
                format!("Soil moisture of {moisture:.1}% is adequate for {crop_name}."),
                format!("For {crop_name}, no irrigation is needed right now."),
                0.8,
            )
        };

        Recommendation {
            decision,
            reason: reason.into(),
            short_message: Some(short_message.into()),
            analysis_points: points,
            confidence: Some(confidence),
        }
    }
}

#[async_trait]
impl RecommendationProvider for RuleBasedRecommender {
    async fn recommend(
        &self,
        reading: &SensorReading,
        weather: &WeatherSnapshot,
        crop: Option<&str>,
    ) -> Recommendation {
        self.decide(reading, weather, crop)
    }
}
