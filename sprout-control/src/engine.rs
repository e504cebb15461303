//! The control loop.
//!
//! A single task owns every piece of control state. Network calls (device,
//! weather, recommendation) run as spawned tasks and report back over a
//! completion channel, so all mutation happens on the loop task in a fixed
//! order: reading, classification, debounce, stability, automation.

use std::sync::Arc;
use std::time::Duration;

use sprout_core::{
    Decision, DeviceReport, MoistureCategory, PumpStatus, Recommendation, SensorReading,
    WeatherSnapshot,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::activity::{ActivitySink, record_detached};
use crate::classifier::classify;
use crate::config::Config;
use crate::debounce::{DebounceEvent, TransitionDebouncer};
use crate::history::SensorHistory;
use crate::pump::{ControlParams, PumpController};
use crate::recommend::{RecommendationProvider, crop_label, provider_reading};
use crate::scheduler::{
    InFlight, RefreshKind, RefreshScheduler, SchedulePeriods, Ticket, arm, new_interval, tick_slot,
};
use crate::sensor::{DeviceClient, DeviceError, DeviceLink, Simulator};
use crate::state::{DashboardSnapshot, DeviceView, Notice, NoticeLevel, Session, normalize};
use crate::weather::{WeatherError, WeatherSource};

const COMMAND_BUFFER: usize = 32;
const COMPLETION_BUFFER: usize = 32;
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

const NO_ADDRESS: &str = "Please enter an IP address.";
const NOT_CONNECTED: &str = "Cannot control pump. Device is not connected.";
const COMMAND_FAILED: &str = "Failed to send command. Check connection.";
const CONNECTION_LOST: &str = "Connection lost. Please check device IP and network.";
const INVALID_RESPONSE: &str = "Invalid response from device.";
const NO_LOCATION: &str = "Please select a location.";
const NO_WEATHER: &str = "Could not fetch weather data. Please check location.";

/// Operator and session commands accepted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartSession,
    EndSession,
    SetLocation(Option<String>),
    SetCrop(Option<String>),
    SetAutomation(bool),
    SetAutoRefresh(bool),
    ManualPump(PumpStatus),
    Connect(String),
    Disconnect,
    SetDemoMoisture(f64),
    RefreshNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandSource {
    Manual,
    Automatic,
}

enum RefreshOutcome {
    Cached(Recommendation),
    Full {
        weather: Result<WeatherSnapshot, WeatherError>,
        recommendation: Option<Recommendation>,
    },
}

enum Completion {
    Refresh {
        ticket: Ticket,
        kind: RefreshKind,
        outcome: RefreshOutcome,
    },
    Poll {
        generation: u64,
        pump_epoch: u64,
        result: Result<DeviceReport, DeviceError>,
    },
    Pump {
        generation: u64,
        status: PumpStatus,
        source: CommandSource,
        result: Result<(), DeviceError>,
    },
    Probe {
        attempt: u64,
        result: Result<DeviceReport, DeviceError>,
    },
}

enum Event {
    Shutdown,
    Command(Option<Command>),
    Completion(Option<Completion>),
    Refresh(RefreshKind),
    SimulationTick,
    PollTick,
    CountdownTick,
}

/// External services the loop talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub device: Arc<dyn DeviceClient>,
    pub weather: Arc<dyn WeatherSource>,
    pub provider: Arc<dyn RecommendationProvider>,
    pub activity: Arc<dyn ActivitySink>,
}

#[derive(Debug, thiserror::Error)]
#[error("control loop is not running")]
pub struct EngineStopped;

/// Cloneable handle for sending commands and reading the latest snapshot.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<DashboardSnapshot>,
}

impl EngineHandle {
    pub async fn send(&self, command: Command) -> Result<(), EngineStopped> {
        self.commands.send(command).await.map_err(|_| EngineStopped)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.clone()
    }
}

pub struct Engine {
    ctx: ControlContext,
    commands: mpsc::Receiver<Command>,
    completions: mpsc::Receiver<Completion>,
    snapshot: watch::Sender<DashboardSnapshot>,
}

impl Engine {
    pub fn new(config: &Config, collaborators: Collaborators) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_BUFFER);

        let ctx = ControlContext::new(config, collaborators, completion_tx);
        let (snapshot_tx, snapshot_rx) = watch::channel(ctx.snapshot(Instant::now()));

        let engine = Self {
            ctx,
            commands: command_rx,
            completions: completion_rx,
            snapshot: snapshot_tx,
        };
        let handle = EngineHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (engine, handle)
    }

    /// Build the engine and run it on its own task.
    pub fn spawn(
        config: &Config,
        collaborators: Collaborators,
        cancel: CancellationToken,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (engine, handle) = Self::new(config, collaborators);
        let task = tokio::spawn(engine.run(cancel));
        (handle, task)
    }

    #[instrument(name = "control_loop", skip_all)]
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Control loop started");

        loop {
            self.ctx.sync_timers();
            self.publish();

            let ctx = &mut self.ctx;
            let event = tokio::select! {
                _ = cancel.cancelled() => Event::Shutdown,
                command = self.commands.recv() => Event::Command(command),
                done = self.completions.recv() => Event::Completion(done),
                kind = ctx.scheduler.next() => Event::Refresh(kind),
                _ = tick_slot(&mut ctx.sim_ticker) => Event::SimulationTick,
                _ = tick_slot(&mut ctx.poll_ticker) => Event::PollTick,
                _ = tick_slot(&mut ctx.countdown) => Event::CountdownTick,
            };

            match event {
                Event::Shutdown => {
                    info!("Control loop shutting down");
                    break;
                }
                Event::Command(Some(command)) => ctx.handle_command(command),
                Event::Command(None) => {
                    info!("All handles dropped, control loop exiting");
                    break;
                }
                Event::Completion(Some(done)) => ctx.handle_completion(done),
                // The context holds a sender, so this never closes.
                Event::Completion(None) => break,
                Event::Refresh(kind) => ctx.request_refresh(kind),
                Event::SimulationTick => ctx.simulate_tick(),
                Event::PollTick => ctx.poll_device(),
                Event::CountdownTick => ctx.countdown_tick(),
            }
        }

        self.ctx.teardown();
        self.publish();
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.ctx.snapshot(Instant::now()));
    }
}

/// All control state, owned by the loop task.
struct ControlContext {
    device: Arc<dyn DeviceClient>,
    weather_source: Arc<dyn WeatherSource>,
    provider: Arc<dyn RecommendationProvider>,
    activity: Arc<dyn ActivitySink>,
    completions: mpsc::Sender<Completion>,

    session: Session,
    reading: SensorReading,
    history: SensorHistory,
    simulator: Simulator,

    link: DeviceLink,
    connect_attempt: u64,
    connecting: bool,
    poll_pending: bool,

    pump: PumpController,
    /// Bumped on every accepted command; polls issued before it carry stale
    /// pump state.
    pump_epoch: u64,
    pump_pending: bool,

    recommendation: Recommendation,
    weather: Option<WeatherSnapshot>,
    weather_error: Option<String>,
    loading: bool,
    notice: Option<Notice>,

    debouncer: TransitionDebouncer,
    countdown: Option<Interval>,
    scheduler: RefreshScheduler,
    in_flight: InFlight,

    sim_period: Duration,
    sim_ticker: Option<Interval>,
    poll_period: Duration,
    poll_ticker: Option<Interval>,
}

impl ControlContext {
    fn new(
        config: &Config,
        collaborators: Collaborators,
        completions: mpsc::Sender<Completion>,
    ) -> Self {
        let reading = config.simulation.initial;
        let mut link = DeviceLink::default();
        if let Some(addr) = normalize(config.device.addr.as_deref()) {
            link.set_addr(addr);
        }

        Self {
            device: collaborators.device,
            weather_source: collaborators.weather,
            provider: collaborators.provider,
            activity: collaborators.activity,
            completions,

            session: Session::from_config(&config.session),
            reading,
            history: SensorHistory::seeded(config.control.history_capacity, reading),
            simulator: Simulator::new(&config.simulation),

            link,
            connect_attempt: 0,
            connecting: false,
            poll_pending: false,

            pump: PumpController::new(ControlParams::from(&config.control), Instant::now()),
            pump_epoch: 0,
            pump_pending: false,

            recommendation: Recommendation::initial(),
            weather: None,
            weather_error: None,
            loading: false,
            notice: None,

            debouncer: TransitionDebouncer::new(config.control.debounce_secs),
            countdown: None,
            scheduler: RefreshScheduler::new(SchedulePeriods::from(&config.schedule)),
            in_flight: InFlight::default(),

            sim_period: config.simulation.tick().max(Duration::from_millis(100)),
            sim_ticker: None,
            poll_period: config.device.poll_interval().max(Duration::from_millis(100)),
            poll_ticker: None,
        }
    }

    fn category(&self) -> MoistureCategory {
        classify(self.reading.soil_moisture)
    }

    /// Arm or drop every timer according to the current gates.
    fn sync_timers(&mut self) {
        let authenticated = self.session.authenticated;
        let connected = self.link.is_connected();

        self.scheduler.sync(authenticated, self.session.auto_refresh);
        arm(&mut self.sim_ticker, authenticated && !connected, self.sim_period);
        arm(&mut self.poll_ticker, connected, self.poll_period);

        if !(authenticated && self.session.auto_refresh) {
            self.debouncer.reset(self.category());
            self.countdown = None;
        }
    }

    fn handle_command(&mut self, command: Command) {
        debug!(?command, "Handling command");
        match command {
            Command::StartSession => {
                if !self.session.authenticated {
                    info!("Session started");
                    self.session.authenticated = true;
                }
            }
            Command::EndSession => {
                if self.session.authenticated {
                    info!("Session ended");
                }
                self.session.authenticated = false;
                self.in_flight.cancel();
                self.loading = false;
                self.debouncer.reset(self.category());
                self.countdown = None;
            }
            Command::SetLocation(location) => {
                let location = normalize(location.as_deref());
                if location != self.session.location {
                    info!(?location, "Location changed");
                    self.session.location = location;
                    self.scheduler.location_changed();
                }
            }
            Command::SetCrop(crop) => {
                self.session.crop = normalize(crop.as_deref());
            }
            Command::SetAutomation(enabled) => {
                info!(enabled, "Automation toggled");
                self.session.automation = enabled;
                self.evaluate_automation();
            }
            Command::SetAutoRefresh(enabled) => {
                info!(enabled, "Auto refresh toggled");
                self.session.auto_refresh = enabled;
            }
            Command::ManualPump(status) => self.command_pump(status, CommandSource::Manual),
            Command::Connect(addr) => self.connect(&addr),
            Command::Disconnect => {
                self.connect_attempt += 1;
                self.connecting = false;
                self.link.disconnect();
                info!("Device disconnected");
                self.notify(NoticeLevel::Info, "Device disconnected");
            }
            Command::SetDemoMoisture(moisture) => {
                if self.link.is_connected() {
                    debug!("Ignoring demo moisture while the device is connected");
                    return;
                }
                let reading = SensorReading {
                    soil_moisture: moisture.clamp(0.0, 100.0),
                    ..self.reading
                };
                self.ingest(reading);
            }
            Command::RefreshNow => self.request_refresh(RefreshKind::Manual),
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Refresh {
                ticket,
                kind,
                outcome,
            } => {
                if !self.in_flight.finish(ticket) {
                    debug!(?kind, "Dropping cancelled recommendation");
                    return;
                }
                self.apply_refresh(kind, outcome);
            }
            Completion::Poll {
                generation,
                pump_epoch,
                result,
            } => {
                self.poll_pending = false;
                if !self.link.is_current(generation) {
                    debug!("Dropping stale device poll");
                    return;
                }
                self.apply_poll(pump_epoch, result);
            }
            Completion::Pump {
                generation,
                status,
                source,
                result,
            } => {
                self.pump_pending = false;
                if !self.link.is_current(generation) {
                    debug!(%status, "Dropping pump result from a previous link");
                    return;
                }
                self.apply_pump_result(status, source, result);
            }
            Completion::Probe { attempt, result } => {
                if attempt != self.connect_attempt {
                    return;
                }
                self.connecting = false;
                match result {
                    // The probe must see both fields; later polls may omit the pump.
                    Ok(DeviceReport {
                        pump_status: None,
                        ..
                    }) => {
                        warn!(addr = self.link.addr(), "Device status has no pump state");
                        self.link.fail(INVALID_RESPONSE);
                        self.notify(NoticeLevel::Error, INVALID_RESPONSE);
                    }
                    Ok(report) => {
                        info!(
                            addr = self.link.addr(),
                            moisture = report.moisture,
                            "Device connected"
                        );
                        self.link.connected();
                        self.notify(NoticeLevel::Success, "Device connected");
                    }
                    Err(e) => {
                        warn!(error = %e, addr = self.link.addr(), "Device connection failed");
                        let message = probe_error_message(&e);
                        self.link.fail(message);
                        self.notify(NoticeLevel::Error, message);
                    }
                }
            }
        }
    }

    /// Accept a new reading and run the per-tick pipeline.
    fn ingest(&mut self, reading: SensorReading) {
        let now = Instant::now();
        self.reading = reading;
        self.history.push(reading);
        let category = classify(reading.soil_moisture);

        if self.session.authenticated && self.session.auto_refresh {
            match self.debouncer.observe(category) {
                DebounceEvent::Started(timer) => {
                    debug!(category = %timer.target_category, "Transition countdown started");
                    self.countdown = Some(new_interval(COUNTDOWN_TICK));
                }
                DebounceEvent::Cancelled => {
                    debug!(%category, "Transition countdown cancelled");
                    self.countdown = None;
                }
                _ => {}
            }
        } else {
            self.debouncer.reset(category);
            self.countdown = None;
        }

        self.pump.track_category(category, now);
        self.evaluate_automation();
    }

    fn simulate_tick(&mut self) {
        let next = self.simulator.next_reading(&self.reading, self.pump.status());
        self.ingest(next);
    }

    fn countdown_tick(&mut self) {
        match self.debouncer.tick(self.category()) {
            DebounceEvent::Fire => {
                self.countdown = None;
                info!(category = %self.category(), "Moisture transition held, refreshing");
                self.request_refresh(RefreshKind::Transition);
            }
            DebounceEvent::Counting(remaining) => {
                debug!(remaining, "Transition countdown");
            }
            DebounceEvent::Cancelled | DebounceEvent::Idle | DebounceEvent::Started(_) => {
                self.countdown = None;
            }
        }
    }

    fn evaluate_automation(&mut self) {
        if !self.session.automation || !self.link.is_connected() || self.pump_pending {
            return;
        }

        let now = Instant::now();
        let decision = self.recommendation.decision;
        let moisture = self.reading.soil_moisture;
        if let Some(status) = self.pump.decide(moisture, decision, now) {
            info!(%status, moisture, ?decision, "Automation switching pump");
            self.command_pump(status, CommandSource::Automatic);
        }
    }

    fn request_refresh(&mut self, kind: RefreshKind) {
        let Some(ticket) = self.in_flight.try_begin() else {
            debug!(?kind, "Recommendation already in flight, dropping refresh");
            return;
        };

        let Some(location) = self.session.location.clone() else {
            self.in_flight.finish(ticket);
            self.recommendation = Recommendation::hold(NO_LOCATION);
            self.weather = None;
            self.weather_error = None;
            self.loading = false;
            self.evaluate_automation();
            return;
        };

        let reading = self.reading;
        let crop = self.session.crop.clone();
        let provider = Arc::clone(&self.provider);
        let completions = self.completions.clone();

        let task = if kind.uses_cached_weather() {
            let Some(weather) = self.weather.clone().filter(WeatherSnapshot::is_usable) else {
                debug!(?kind, "No cached weather yet, skipping refresh");
                self.in_flight.finish(ticket);
                return;
            };

            tokio::spawn(async move {
                let input = provider_reading(&reading, &weather);
                let recommendation = provider.recommend(&input, &weather, crop.as_deref()).await;
                let outcome = RefreshOutcome::Cached(recommendation);
                send(&completions, Completion::Refresh { ticket, kind, outcome }).await;
            })
        } else {
            if kind.shows_loading(self.session.auto_refresh) {
                self.loading = true;
            }
            let weather_source = Arc::clone(&self.weather_source);

            tokio::spawn(async move {
                let weather = weather_source.fetch(&location).await;
                let recommendation = match &weather {
                    Ok(snapshot) if snapshot.is_usable() => {
                        let input = provider_reading(&reading, snapshot);
                        Some(provider.recommend(&input, snapshot, crop.as_deref()).await)
                    }
                    _ => None,
                };
                let outcome = RefreshOutcome::Full {
                    weather,
                    recommendation,
                };
                send(&completions, Completion::Refresh { ticket, kind, outcome }).await;
            })
        };

        debug!(?kind, "Recommendation refresh started");
        self.in_flight.attach(ticket, task.abort_handle());
    }

    fn apply_refresh(&mut self, kind: RefreshKind, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Cached(recommendation) => {
                info!(?kind, decision = ?recommendation.decision, "Recommendation updated");
                self.recommendation = recommendation;
            }
            RefreshOutcome::Full {
                weather,
                recommendation,
            } => {
                self.loading = false;
                match (weather, recommendation) {
                    (Ok(snapshot), Some(recommendation)) => {
                        info!(
                            ?kind,
                            decision = ?recommendation.decision,
                            location = snapshot.resolved_location.as_deref(),
                            "Recommendation updated"
                        );
                        self.weather = Some(snapshot);
                        self.weather_error = None;
                        self.recommendation = recommendation;
                        self.log_advisory();
                    }
                    (Ok(_), None) => {
                        warn!(?kind, "Weather snapshot has no forecast");
                        self.weather = None;
                        self.weather_error = Some(NO_WEATHER.to_string());
                        self.recommendation = Recommendation::error(NO_WEATHER);
                    }
                    (Err(e), _) => {
                        warn!(?kind, error = %e, "Weather fetch failed");
                        let message = e.to_string();
                        self.weather = None;
                        self.recommendation = Recommendation::error(message.as_str());
                        self.weather_error = Some(message);
                    }
                }
            }
        }

        self.evaluate_automation();
    }

    /// With automation off, an Irrigate verdict for an idle pump is only logged.
    fn log_advisory(&self) {
        if self.session.automation
            || self.recommendation.decision != Decision::Irrigate
            || self.pump.status() != PumpStatus::Off
        {
            return;
        }

        let details = advisory_details(&self.recommendation, self.session.crop.as_deref());
        self.audit("AI Recommended Irrigation".to_string(), details);
    }

    fn connect(&mut self, addr: &str) {
        let Some(addr) = normalize(Some(addr)) else {
            self.link.report(NO_ADDRESS);
            self.notify(NoticeLevel::Error, NO_ADDRESS);
            return;
        };

        info!(%addr, "Connecting to device");
        self.link.set_addr(addr.as_str());
        self.link.clear_error();
        self.connect_attempt += 1;
        self.connecting = true;

        let attempt = self.connect_attempt;
        let device = Arc::clone(&self.device);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = device.status(&addr).await;
            send(&completions, Completion::Probe { attempt, result }).await;
        });
    }

    fn poll_device(&mut self) {
        if self.poll_pending {
            debug!("Previous device poll still outstanding");
            return;
        }
        let Some(addr) = self.link.addr().map(str::to_string) else {
            return;
        };

        self.poll_pending = true;
        let generation = self.link.generation();
        let pump_epoch = self.pump_epoch;
        let device = Arc::clone(&self.device);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = device.status(&addr).await;
            let done = Completion::Poll {
                generation,
                pump_epoch,
                result,
            };
            send(&completions, done).await;
        });
    }

    fn apply_poll(&mut self, pump_epoch: u64, result: Result<DeviceReport, DeviceError>) {
        match result {
            Ok(report) => {
                self.link.clear_error();
                if let Some(status) = report.pump_status {
                    if pump_epoch == self.pump_epoch
                        && self.pump.apply_observation(status, Instant::now())
                    {
                        info!(%status, "Device reported pump change");
                        self.audit(
                            format!("Pump Automatically Turned {status} by Device"),
                            "Device reported new status.".to_string(),
                        );
                    }
                }

                // Temperature and humidity stay with the previous reading.
                let reading = SensorReading {
                    soil_moisture: report.moisture.clamp(0.0, 100.0),
                    ..self.reading
                };
                self.ingest(reading);
            }
            Err(e) => {
                warn!(error = %e, addr = self.link.addr(), "Device poll failed, disconnecting");
                self.link.fail(CONNECTION_LOST);
                self.notify(NoticeLevel::Error, CONNECTION_LOST);
            }
        }
    }

    fn command_pump(&mut self, status: PumpStatus, source: CommandSource) {
        if !self.link.is_connected() {
            self.link.report(NOT_CONNECTED);
            self.notify(NoticeLevel::Error, NOT_CONNECTED);
            return;
        }
        if self.pump_pending {
            debug!(%status, ?source, "Pump command already outstanding");
            return;
        }
        let Some(addr) = self.link.addr().map(str::to_string) else {
            return;
        };

        self.pump_pending = true;
        let generation = self.link.generation();
        let device = Arc::clone(&self.device);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = device.set_pump(&addr, status).await;
            let done = Completion::Pump {
                generation,
                status,
                source,
                result,
            };
            send(&completions, done).await;
        });
    }

    fn apply_pump_result(
        &mut self,
        status: PumpStatus,
        source: CommandSource,
        result: Result<(), DeviceError>,
    ) {
        match result {
            Ok(()) => {
                self.pump_epoch += 1;
                let changed = self.pump.apply_command(status, Instant::now());
                info!(%status, ?source, changed, "Pump command accepted");

                let (action, details) = match source {
                    CommandSource::Manual => (
                        format!("Pump Manually Turned {status}"),
                        "User override command sent to device.",
                    ),
                    CommandSource::Automatic => (
                        format!("Pump Automatically Turned {status} by AI"),
                        "AI mode executed action based on latest decision.",
                    ),
                };
                self.audit(action, details.to_string());
                self.evaluate_automation();
            }
            Err(e) => {
                warn!(error = %e, %status, "Pump command failed, disconnecting");
                self.link.fail(COMMAND_FAILED);
                self.notify(NoticeLevel::Error, COMMAND_FAILED);
            }
        }
    }

    fn audit(&self, action: String, details: String) {
        info!(%action, %details, "Activity");
        record_detached(&self.activity, action, details);
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notice = Some(Notice::new(level, message));
    }

    fn teardown(&mut self) {
        self.scheduler.teardown();
        self.in_flight.cancel();
        self.loading = false;
        self.countdown = None;
        self.sim_ticker = None;
        self.poll_ticker = None;
    }

    fn snapshot(&self, now: Instant) -> DashboardSnapshot {
        DashboardSnapshot {
            authenticated: self.session.authenticated,
            location: self.session.location.as_deref().map(Into::into),
            crop: self.session.crop.as_deref().map(Into::into),
            automation: self.session.automation,
            auto_refresh: self.session.auto_refresh,
            reading: self.reading,
            category: self.category(),
            pump: self.pump.view(now),
            recommendation: self.recommendation.clone(),
            weather: self.weather.clone(),
            weather_error: self.weather_error.as_deref().map(Into::into),
            device: DeviceView::new(&self.link, self.connecting),
            transition: self.debouncer.timer().copied(),
            loading: self.loading,
            refresh_in_flight: self.in_flight.is_busy(),
            timers: self.scheduler.armed(),
            notice: self.notice.clone(),
            history: self.history.to_vec(),
        }
    }
}

async fn send(completions: &mpsc::Sender<Completion>, completion: Completion) {
    if completions.send(completion).await.is_err() {
        debug!("Control loop gone, dropping completion");
    }
}

fn probe_error_message(error: &DeviceError) -> &'static str {
    match error {
        DeviceError::Transport(_) => {
            "Connection failed. Check: 1) Device is on the same WiFi. 2) IP address is correct. 3) No firewall is blocking the connection."
        }
        DeviceError::Status { .. } => "Device not found or not responding.",
        DeviceError::Malformed(_) => INVALID_RESPONSE,
    }
}

fn advisory_details(recommendation: &Recommendation, crop: Option<&str>) -> String {
    let short = recommendation
        .short_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    match short {
        Some(short) => short.to_string(),
        None => {
            let crop = crop_label(crop)
                .map(|c| format!(" for crop \"{c}\""))
                .unwrap_or_default();
            format!("Irrigate{crop}. Reason: {}", recommendation.reason)
        }
    }
}
