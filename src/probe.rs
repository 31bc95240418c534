//! Reachability probe
//!
//! A single bounded GET against `<server>/api/`. The result is advisory: the
//! orchestrator opens the view whatever the probe says, because servers
//! commonly reject the bare API request while the frontend loads fine.

use crate::address;
use crate::error::ProbeError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Prober: Send + Sync {
    /// Check that `server_url` answers. `Ok` only for a 2xx response.
    async fn probe(&self, server_url: &str, token: Option<&str>) -> Result<(), ProbeError>;
}

/// reqwest-backed probe
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, server_url: &str, token: Option<&str>) -> Result<(), ProbeError> {
        let url = address::probe_url(server_url);
        let mut request = self
            .client
            .get(&url)
            .header("Content-Type", "application/json");
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout
            } else {
                ProbeError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Probe {} answered {}", url, status);
            Ok(())
        } else {
            Err(ProbeError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            })
        }
    }
}
