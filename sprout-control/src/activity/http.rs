use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sprout_core::{ActivityEntry, ActivityId};

use super::{ActivityError, ActivitySink};

/// Activity log kept by the dashboard backend (`/api/activity`), scoped to the
/// user owning `token`.
pub struct HttpActivityLog {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpActivityLog {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/activity", self.base_url)
    }
}

#[derive(Serialize)]
struct CreateActivity<'a> {
    action: &'a str,
    metadata: Metadata<'a>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    details: &'a str,
}

#[derive(Deserialize)]
struct RemoteActivity {
    #[serde(rename = "_id")]
    id: String,
    action: String,
    #[serde(default)]
    metadata: Option<RemoteMetadata>,
    #[serde(rename = "createdAt")]
    created_at: jiff::Timestamp,
}

#[derive(Deserialize)]
struct RemoteMetadata {
    #[serde(default)]
    details: Option<String>,
}

#[derive(Deserialize)]
struct Deleted {
    deleted: usize,
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ActivityError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ActivityError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ActivitySink for HttpActivityLog {
    async fn record(&self, action: &str, details: &str) -> Result<(), ActivityError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&CreateActivity {
                action,
                metadata: Metadata { details },
            })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ActivityEntry>, ActivityError> {
        let resp = self
            .http
            .get(self.endpoint())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let remote: Vec<RemoteActivity> = check(resp).await?.json().await?;

        Ok(remote
            .into_iter()
            .map(|r| ActivityEntry {
                id: ActivityId(r.id.into()),
                action: r.action.into(),
                details: r
                    .metadata
                    .and_then(|m| m.details)
                    .unwrap_or_default()
                    .into(),
                timestamp: r.created_at,
            })
            .collect())
    }

    async fn clear(&self) -> Result<usize, ActivityError> {
        let resp = self
            .http
            .delete(self.endpoint())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let deleted: Deleted = check(resp).await?.json().await?;
        Ok(deleted.deleted)
    }
}
