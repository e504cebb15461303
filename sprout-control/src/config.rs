use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sprout_core::SensorReading;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub device: DeviceConfig,
    pub simulation: SimulationConfig,
    pub control: ControlConfig,
    pub schedule: ScheduleConfig,
    pub weather: WeatherConfig,
    pub recommender: RecommenderConfig,
    pub activity: ActivityConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

/// Initial operator settings. Authentication is handled upstream; `auto_start`
/// opens the session as soon as the daemon starts.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub auto_start: bool,
    /// Location name passed to the weather source, e.g. "Bogura, Bangladesh"
    pub location: Option<String>,
    /// Crop label passed to the recommendation provider
    pub crop: Option<String>,
    /// Whether automatic pump control starts enabled
    pub automation: bool,
    /// Whether the fast heartbeat and transition refreshes start enabled
    pub auto_refresh: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device address to connect to on startup (host or host:port)
    pub addr: Option<String>,
    /// Interval in seconds between status polls while connected
    pub poll_interval_secs: u64,
    /// Timeout in seconds for a single device request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interval in seconds between simulated readings
    pub tick_secs: u64,
    /// Reading the simulation starts from
    pub initial: SensorReading,
    /// Moisture gained per tick while the pump runs
    pub pump_increment: f64,
    /// Moisture lost per tick at 20 °C while the pump is off
    pub decay_factor: f64,
    /// Width of the temperature/humidity random walk per tick
    pub walk_step: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Minimum seconds the pump stays on before it may be switched off
    pub min_on_secs: u64,
    /// Minimum seconds the pump stays off before it may be switched on
    pub min_off_secs: u64,
    /// Moisture at or below which the pump may be switched on
    pub on_threshold: f64,
    /// Moisture at or above which the pump may be switched off
    pub off_threshold: f64,
    /// Seconds an Optimal/Wet category must hold before early shut-off
    pub stable_window_secs: u64,
    /// Countdown length for Dry/Optimal transition refreshes
    pub debounce_secs: u32,
    /// Number of readings kept in the rolling history
    pub history_capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Slow re-evaluation period used while the heartbeat is disabled
    pub fallback_secs: u64,
    /// Cached-weather heartbeat period used while auto refresh is enabled
    pub heartbeat_secs: u64,
    /// Full weather + recommendation refresh period
    pub full_refresh_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WeatherConfig {
    /// Built-in fixed forecast, no network access
    Static,
    OpenWeather {
        api_key: String,
        #[serde(default = "default_openweather_url")]
        base_url: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecommenderConfig {
    /// Offline agronomy rules
    Rules,
    Http {
        url: String,
        api_key: Option<String>,
        #[serde(default = "default_recommender_timeout")]
        timeout_secs: u64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityConfig {
    Memory {
        #[serde(default = "default_activity_capacity")]
        capacity: usize,
    },
    Http {
        base_url: String,
        token: String,
    },
}

fn default_openweather_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_recommender_timeout() -> u64 {
    30
}

fn default_activity_capacity() -> usize {
    500
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            addr: None,
            poll_interval_secs: 2,
            request_timeout_secs: 5,
        }
    }
}

impl DeviceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            initial: SensorReading::default(),
            pump_increment: 2.0,
            decay_factor: 0.5,
            walk_step: 1.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            min_on_secs: 20,
            min_off_secs: 10,
            on_threshold: 30.0,
            off_threshold: 55.0,
            stable_window_secs: 5,
            debounce_secs: 5,
            history_capacity: 50,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fallback_secs: 60,
            heartbeat_secs: 30,
            full_refresh_secs: 10 * 60,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self::Static
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self::Rules
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self::Memory {
            capacity: default_activity_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.control.min_on_secs, 20);
        assert_eq!(config.control.min_off_secs, 10);
        assert_eq!(config.control.history_capacity, 50);
        assert_eq!(config.schedule.full_refresh_secs, 600);
        assert_eq!(config.device.poll_interval_secs, 2);
        assert!(matches!(config.weather, WeatherConfig::Static));
        assert!(matches!(config.recommender, RecommenderConfig::Rules));
    }

    #[test]
    fn tagged_sections_parse() {
        let config: Config = toml::from_str(
            r#"
            [session]
            auto_start = true
            location = "Bogura, Bangladesh"
            crop = "rice"
            automation = true

            [device]
            addr = "192.168.4.1"

            [weather]
            type = "openweather"
            api_key = "secret"

            [recommender]
            type = "http"
            url = "http://127.0.0.1:7000/recommend"

            [activity]
            type = "memory"
            capacity = 10
            "#,
        )
        .unwrap();

        assert!(config.session.auto_start);
        assert_eq!(config.session.crop.as_deref(), Some("rice"));
        assert_eq!(config.device.addr.as_deref(), Some("192.168.4.1"));
        match config.weather {
            WeatherConfig::OpenWeather { api_key, base_url } => {
                assert_eq!(api_key, "secret");
                assert_eq!(base_url, "https://api.openweathermap.org");
            }
            other => panic!("unexpected weather config: {other:?}"),
        }
        match config.recommender {
            RecommenderConfig::Http { timeout_secs, .. } => assert_eq!(timeout_secs, 30),
            other => panic!("unexpected recommender config: {other:?}"),
        }
        assert!(matches!(config.activity, ActivityConfig::Memory { capacity: 10 }));
    }
}
