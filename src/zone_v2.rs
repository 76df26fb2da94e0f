//! ZoneID v2 API client for A records
//!
//! JSON over HTTP with basic authentication (`zoneid:token`).
//! Records live under `/v2/dns/<domain>/a`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{HEADER_STATUS_MESSAGE, USER_AGENT, ZONE_API_V2_BASE};
use crate::dns_provider::{
    null_as_default, null_as_writable, DnsProvider, DnsRecord, Upsert,
};
use crate::error::DdnsError;
use crate::fqdn::FqdnParts;

//==============================================================================
// Types
//==============================================================================

/// A record as exchanged with the v2 API
///
/// Missing keys and `null` values both fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct ARecord {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(rename = "modify", deserialize_with = "null_as_writable")]
    allow_modify: bool,
    #[serde(rename = "delete", deserialize_with = "null_as_writable")]
    allow_delete: bool,
    #[serde(deserialize_with = "null_as_default")]
    destination: String,
    #[serde(
        rename = "resource_url",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    resource: String,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
}

impl Default for ARecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            allow_modify: true,
            allow_delete: true,
            destination: String::new(),
            resource: String::new(),
            name: String::new(),
        }
    }
}

impl From<ARecord> for DnsRecord {
    fn from(r: ARecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            destination: r.destination,
            allow_modify: r.allow_modify,
            allow_delete: r.allow_delete,
            resource_url: r.resource,
        }
    }
}

//==============================================================================
// Client
//==============================================================================

pub struct ZoneV2Client {
    zone_id: Zeroizing<String>,
    token: Zeroizing<String>,
    /// `<base>/dns/<domain>/`
    domain_url: String,
    client: reqwest::Client,
}

impl ZoneV2Client {
    pub fn new(zone_id: &str, token: &str, domain: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(ZONE_API_V2_BASE, zone_id, token, domain, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        zone_id: &str,
        token: &str,
        domain: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            zone_id: Zeroizing::new(zone_id.to_string()),
            token: Zeroizing::new(token.to_string()),
            domain_url: format!("{}/dns/{}/", base_url.trim_end_matches('/'), encode(domain)),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.domain_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .basic_auth(self.zone_id.as_str(), Some(self.token.as_str()))
    }

    /// Sends the request, turning transport failures and 401 into typed errors
    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| DdnsError::transport(format!("{} request failed", what), e))?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(DdnsError::Unauthorized.into());
        }

        Ok(resp)
    }
}

/// `X-Status-Message` header, if the API sent one
fn status_message(resp: &Response) -> Option<String> {
    resp.headers()
        .get(HEADER_STATUS_MESSAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl DnsProvider for ZoneV2Client {
    fn name(&self) -> &'static str {
        "zone-v2"
    }

    fn match_key(&self, fqdn: &str, _parts: &FqdnParts) -> String {
        fqdn.to_string()
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        let resp = self.send(self.request(Method::GET, "a"), "GET").await?;
        let status = resp.status();

        if !status.is_success() {
            let message = status_message(&resp).unwrap_or_else(|| "listing A records failed".into());
            return Err(DdnsError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DdnsError::transport("Reading A records failed", e))?;
        let records: Vec<ARecord> = serde_json::from_str(&body)
            .map_err(|e| DdnsError::Protocol(format!("A record list: {}", e)))?;

        debug!("Listed {} A records", records.len());
        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    async fn upsert_record(
        &self,
        existing: Option<&DnsRecord>,
        fqdn: &str,
        _parts: &FqdnParts,
        ip: &str,
    ) -> Result<Upsert> {
        let (path, payload, outcome) = match existing {
            Some(record) if !record.id.is_empty() => (
                format!("a/{}", encode(&record.id)),
                ARecord {
                    id: record.id.clone(),
                    allow_modify: record.allow_modify,
                    allow_delete: record.allow_delete,
                    destination: ip.to_string(),
                    resource: record.resource_url.clone(),
                    name: record.name.clone(),
                },
                Upsert::Updated,
            ),
            _ => (
                "a".to_string(),
                ARecord {
                    destination: ip.to_string(),
                    name: fqdn.to_string(),
                    ..Default::default()
                },
                Upsert::Created,
            ),
        };

        let req = self.request(Method::PUT, &path).json(&payload);
        let resp = self.send(req, "PUT").await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            let message = status_message(&resp)
                .unwrap_or_else(|| format!("record {} not found", payload.id));
            return Err(DdnsError::RecordNotFound(message).into());
        }
        if !status.is_success() {
            let message = status_message(&resp).unwrap_or_else(|| "write rejected".into());
            return Err(DdnsError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(outcome)
    }
}

//==============================================================================
// Tests
//==============================================================================
