use std::time::Duration;

use async_trait::async_trait;
use sprout_core::{DeviceReport, PumpCommand, PumpStatus};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("device responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from device: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Field device exposing `GET /status` and `POST /pump`.
#[async_trait]
pub trait DeviceClient: Send + Sync + 'static {
    /// Read the current moisture and, when the firmware reports it, pump state.
    async fn status(&self, addr: &str) -> Result<DeviceReport, DeviceError>;

    /// Command the pump.
    async fn set_pump(&self, addr: &str, status: PumpStatus) -> Result<(), DeviceError>;
}

/// Device reachable over plain HTTP on the local network.
pub struct HttpDevice {
    http: reqwest::Client,
}

impl HttpDevice {
    pub fn new(timeout: Duration) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

/// Accept a bare host (`192.168.4.1`) or a full base URL.
fn base_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

#[async_trait]
impl DeviceClient for HttpDevice {
    async fn status(&self, addr: &str) -> Result<DeviceReport, DeviceError> {
        let resp = self
            .http
            .get(format!("{}/status", base_url(addr)))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DeviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn set_pump(&self, addr: &str, status: PumpStatus) -> Result<(), DeviceError> {
        let resp = self
            .http
            .post(format!("{}/pump", base_url(addr)))
            .json(&PumpCommand { state: status })
            .send()
            .await?;

        let code = resp.status();
        if !code.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeviceError::Status {
                status: code.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
