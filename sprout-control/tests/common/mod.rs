#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sprout_control::activity::ActivitySink;
use sprout_control::{
    Collaborators, Config, DeviceClient, DeviceError, Engine, EngineHandle, FixedWeather,
    MemoryActivityLog, RecommendationProvider, WeatherError, WeatherSource,
};
use sprout_core::{
    Decision, DeviceReport, PumpStatus, Recommendation, SensorReading, WeatherSnapshot,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct DeviceState {
    moisture: f64,
    pump: PumpStatus,
    reports_pump: bool,
    failing: bool,
}

/// Field device that answers from memory. Pump commands update the reported
/// pump state.
pub struct FakeDevice {
    state: Mutex<DeviceState>,
    status_calls: AtomicUsize,
    commands: Mutex<Vec<PumpStatus>>,
}

impl FakeDevice {
    pub fn new(moisture: f64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DeviceState {
                moisture,
                pump: PumpStatus::Off,
                reports_pump: true,
                failing: false,
            }),
            status_calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn set_moisture(&self, moisture: f64) {
        self.state.lock().unwrap().moisture = moisture;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Emulate firmware that only reports moisture.
    pub fn set_reports_pump(&self, reports_pump: bool) {
        self.state.lock().unwrap().reports_pump = reports_pump;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<PumpStatus> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceClient for FakeDevice {
    async fn status(&self, _addr: &str) -> Result<DeviceReport, DeviceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing {
            return Err(DeviceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(DeviceReport {
            moisture: state.moisture,
            pump_status: state.reports_pump.then_some(state.pump),
        })
    }

    async fn set_pump(&self, _addr: &str, status: PumpStatus) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(DeviceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        state.pump = status;
        self.commands.lock().unwrap().push(status);
        Ok(())
    }
}

/// Provider that counts invocations and answers with a fixed verdict after
/// `delay`.
pub struct CountingProvider {
    calls: AtomicUsize,
    delay: Duration,
    decision: Decision,
    short_message: Option<&'static str>,
    last_moisture: Mutex<Option<f64>>,
}

impl CountingProvider {
    pub fn new(decision: Decision, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            decision,
            short_message: None,
            last_moisture: Mutex::new(None),
        })
    }

    pub fn with_message(decision: Decision, short_message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            decision,
            short_message: Some(short_message),
            last_moisture: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Soil moisture passed on the most recent call.
    pub fn last_moisture(&self) -> Option<f64> {
        *self.last_moisture.lock().unwrap()
    }
}

#[async_trait]
impl RecommendationProvider for CountingProvider {
    async fn recommend(
        &self,
        reading: &SensorReading,
        _weather: &WeatherSnapshot,
        _crop: Option<&str>,
    ) -> Recommendation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_moisture.lock().unwrap() = Some(reading.soil_moisture);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Recommendation {
            decision: self.decision,
            reason: "Scripted verdict.".into(),
            short_message: self.short_message.map(Into::into),
            analysis_points: Box::new([]),
            confidence: Some(0.9),
        }
    }
}

/// Fixed forecast that counts fetches. An unusable source answers with an
/// empty forecast.
pub struct CountingWeather {
    fetches: AtomicUsize,
    usable: Mutex<bool>,
}

impl CountingWeather {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            usable: Mutex::new(true),
        })
    }

    pub fn set_usable(&self, usable: bool) {
        *self.usable.lock().unwrap() = usable;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for CountingWeather {
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut snapshot = FixedWeather.fetch(location).await?;
        if !*self.usable.lock().unwrap() {
            snapshot.forecast = Box::new([]);
        }
        Ok(snapshot)
    }
}

pub fn config(location: Option<&str>) -> Config {
    let mut config = Config::default();
    config.simulation.seed = Some(7);
    config.session.location = location.map(str::to_string);
    config
}

pub struct Harness {
    pub handle: EngineHandle,
    pub device: Arc<FakeDevice>,
    pub provider: Arc<CountingProvider>,
    pub weather: Arc<CountingWeather>,
    pub activity: Arc<MemoryActivityLog>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn start(config: Config, device: Arc<FakeDevice>, provider: Arc<CountingProvider>) -> Self {
        let activity = Arc::new(MemoryActivityLog::new(100));
        let weather = CountingWeather::new();
        let collaborators = Collaborators {
            device: device.clone(),
            weather: weather.clone(),
            provider: provider.clone(),
            activity: activity.clone(),
        };
        let cancel = CancellationToken::new();
        let (handle, task) = Engine::spawn(&config, collaborators, cancel.clone());

        Self {
            handle,
            device,
            provider,
            weather,
            activity,
            cancel,
            task,
        }
    }

    pub async fn send(&self, command: sprout_control::Command) {
        self.handle.send(command).await.unwrap();
        settle().await;
    }

    pub async fn actions(&self) -> Vec<String> {
        self.activity
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.action.to_string())
            .collect()
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        self.task.await.unwrap();
    }
}

/// Let the loop drain everything that is ready.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
