//! External IP lookup through a plain-text echo service

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::error::DdnsError;

/// Fetches the caller's public address from a plain-text echo endpoint
pub struct IpResolver {
    url: String,
    client: reqwest::Client,
}

impl IpResolver {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Returns the trimmed response body
    ///
    /// The text is treated as opaque and only compared for equality later on.
    pub async fn resolve(&self) -> Result<String> {
        debug!("GET {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DdnsError::transport("External IP request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DdnsError::Api {
                status: status.as_u16(),
                message: format!("IP echo service {} failed", self.url),
            }
            .into());
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DdnsError::transport("Reading external IP failed", e))?;
        let ip = body.trim();
        if ip.is_empty() {
            return Err(DdnsError::Protocol("IP echo service returned an empty body".into()).into());
        }

        Ok(ip.to_string())
    }
}
