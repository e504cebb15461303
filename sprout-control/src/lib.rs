pub mod activity;
pub mod api;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod history;
pub mod pump;
pub mod recommend;
pub mod scheduler;
pub mod sensor;
pub mod state;
pub mod weather;

pub use activity::{ActivityError, ActivitySink, HttpActivityLog, MemoryActivityLog};
pub use api::{ApiState, router};
pub use classifier::classify;
pub use config::{
    ActivityConfig, Config, ControlConfig, DeviceConfig, RecommenderConfig, ScheduleConfig,
    ServerConfig, SessionConfig, SimulationConfig, WeatherConfig,
};
pub use engine::{Collaborators, Command, Engine, EngineHandle, EngineStopped};
pub use recommend::{HttpRecommender, RecommendationProvider, RuleBasedRecommender};
pub use sensor::{DeviceClient, DeviceError, HttpDevice};
pub use state::DashboardSnapshot;
pub use weather::{FixedWeather, OpenWeather, WeatherError, WeatherSource};
