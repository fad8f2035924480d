//! HTTP client for a remote timeline server's state endpoint.

use anyhow::{Context, Result};
use serde_json::Value;

use timeline_core::models::AppState;
use timeline_core::normalize_value;

#[derive(Debug, Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn state_url(&self) -> String {
        format!("{}/api/state", self.base_url)
    }

    /// Fetch the whole state blob and normalize it locally.
    pub async fn fetch_state(&self) -> Result<AppState> {
        let url = self.state_url();
        let blob: Value = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()?
            .json()
            .await
            .context("Server returned a state that is not JSON")?;
        Ok(normalize_value(&blob))
    }

    /// Replace the remote state with `state`.
    pub async fn save_state(&self, state: &AppState) -> Result<()> {
        let url = self.state_url();
        self.http
            .post(&url)
            .json(state)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()
            .context("Server rejected the state")?;
        Ok(())
    }
}
