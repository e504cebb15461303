//! Sensor sources: the in-process soil simulation and the polled field device.
//!
//! The two modes are mutually exclusive. [`DeviceLink`] decides which one is
//! live: while the device is connected its reports are authoritative, otherwise
//! the simulation drives the readings.

pub mod device;
pub mod simulated;

pub use device::{DeviceClient, DeviceError, HttpDevice};
pub use simulated::Simulator;

/// Which source currently produces readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    Simulated,
    Device,
}

/// Connectivity state for the field device.
///
/// Every connect, disconnect or failure bumps the generation so that results of
/// requests issued under an older link can be recognised and dropped.
#[derive(Debug, Clone, Default)]
pub struct DeviceLink {
    addr: Option<String>,
    connected: bool,
    error: Option<String>,
    generation: u64,
}

impl DeviceLink {
    pub fn mode(&self) -> SensorMode {
        if self.connected {
            SensorMode::Device
        } else {
            SensorMode::Simulated
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn addr(&self) -> Option<&str> {
        self.addr.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if a request issued under `generation` still belongs to the live link.
    pub fn is_current(&self, generation: u64) -> bool {
        self.connected && self.generation == generation
    }

    /// Remember the address the operator asked to connect to.
    pub fn set_addr(&mut self, addr: impl Into<String>) {
        self.addr = Some(addr.into());
    }

    pub fn connected(&mut self) {
        self.connected = true;
        self.error = None;
        self.generation += 1;
    }

    /// Drop the link and keep `message` for the operator. Polling does not
    /// resume until an explicit reconnect.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.connected = false;
        self.error = Some(message.into());
        self.generation += 1;
    }

    /// Record an error without changing connectivity.
    pub fn report(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
        self.error = None;
        self.generation += 1;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
