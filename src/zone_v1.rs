//! ZoneID legacy (v1) API client for A records
//!
//! Authenticates with `X-ZoneID-Token: zoneid:token`, answers in an
//! envelope keyed by domain and takes form-encoded writes:
//!
//! ```json
//! {"status": "OK", "messages": [], "params": {"example.com": {"a": {"7": {"id": "7", "host": "home", "content": "203.0.113.1", "allow_modify": true, "allow_delete": true}}}}}
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{
    DNS_RECORD_TYPE_A, HEADER_RESPONSE_TYPE, HEADER_ZONE_TOKEN, USER_AGENT, V1_INVALID_TOKEN_BODY,
    ZONE_API_V1_BASE,
};
use crate::dns_provider::{
    null_as_default, null_as_writable, DnsProvider, DnsRecord, Upsert,
};
use crate::error::DdnsError;
use crate::fqdn::FqdnParts;

//==============================================================================
// Types
//==============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    params: IndexMap<String, DomainParams>,
}

impl Envelope {
    fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    fn message(&self) -> String {
        if self.messages.is_empty() {
            return "request failed".to_string();
        }
        self.messages.join(", ")
    }
}

#[derive(Debug, Default, Deserialize)]
struct DomainParams {
    /// Records keyed by id, in the order the API sent them
    #[serde(default)]
    a: IndexMap<String, LegacyRecord>,
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default = "writable", deserialize_with = "null_as_writable")]
    allow_modify: bool,
    #[serde(default = "writable", deserialize_with = "null_as_writable")]
    allow_delete: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    host: String,
}

impl From<LegacyRecord> for DnsRecord {
    fn from(r: LegacyRecord) -> Self {
        Self {
            id: r.id,
            name: r.host,
            destination: r.content,
            allow_modify: r.allow_modify,
            allow_delete: r.allow_delete,
            resource_url: String::new(),
        }
    }
}

fn writable() -> bool {
    true
}

/// The API answers bad credentials with a bare text body instead of a 401
fn is_invalid_token_body(body: &str) -> bool {
    body.trim()
        .trim_matches('"')
        .eq_ignore_ascii_case(V1_INVALID_TOKEN_BODY)
}

//==============================================================================
// Client
//==============================================================================

pub struct ZoneV1Client {
    auth: Zeroizing<String>,
    domain: String,
    /// `<base>/domains/<domain>/`
    domain_url: String,
    client: reqwest::Client,
}

impl ZoneV1Client {
    pub fn new(zone_id: &str, token: &str, domain: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(ZONE_API_V1_BASE, zone_id, token, domain, timeout)
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
            auth: Zeroizing::new(format!("{}:{}", zone_id, token)),
            domain: domain.to_string(),
            domain_url: format!(
                "{}/domains/{}/",
                base_url.trim_end_matches('/'),
                encode(domain)
            ),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.domain_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header(HEADER_ZONE_TOKEN, self.auth.as_str())
            .header(HEADER_RESPONSE_TYPE, "JSON")
    }

    /// Sends the request and returns status and body, with credential
    /// rejections mapped to [`DdnsError::Unauthorized`]
    async fn send(&self, req: RequestBuilder, what: &str) -> Result<(StatusCode, String)> {
        let resp = req
            .send()
            .await
            .map_err(|e| DdnsError::transport(format!("{} request failed", what), e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DdnsError::transport(format!("Reading {} response failed", what), e))?;

        if status == StatusCode::UNAUTHORIZED || is_invalid_token_body(&body) {
            return Err(DdnsError::Unauthorized.into());
        }

        Ok((status, body))
    }
}

#[async_trait]
impl DnsProvider for ZoneV1Client {
    fn name(&self) -> &'static str {
        "zone-v1"
    }

    fn match_key(&self, _fqdn: &str, parts: &FqdnParts) -> String {
        parts.host.clone()
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        let (status, body) = self.send(self.request(Method::GET, "records"), "GET").await?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(DdnsError::Protocol(format!("record envelope: {}", e)).into());
            }
            Err(_) => {
                return Err(DdnsError::Api {
                    status: status.as_u16(),
                    message: "listing records failed".into(),
                }
                .into());
            }
        };

        if !status.is_success() || envelope.is_error() {
            return Err(DdnsError::Api {
                status: status.as_u16(),
                message: envelope.message(),
            }
            .into());
        }

        let mut params = envelope.params;
        let records: Vec<LegacyRecord> = match params.shift_remove(&self.domain) {
            Some(domain) => domain.a.into_values().collect(),
            None => {
                debug!("No record section for {}", self.domain);
                Vec::new()
            }
        };

        debug!("Listed {} A records", records.len());
        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    async fn upsert_record(
        &self,
        existing: Option<&DnsRecord>,
        _fqdn: &str,
        parts: &FqdnParts,
        ip: &str,
    ) -> Result<Upsert> {
        let (path, outcome) = match existing {
            Some(record) if !record.id.is_empty() => {
                (format!("records/{}", encode(&record.id)), Upsert::Updated)
            }
            _ => ("records".to_string(), Upsert::Created),
        };

        let form = [
            ("type", DNS_RECORD_TYPE_A),
            ("prefix", parts.host.as_str()),
            ("content", ip),
        ];
        let req = self.request(Method::POST, &path).form(&form);
        let (status, body) = self.send(req, "POST").await?;

        let envelope = serde_json::from_str::<Envelope>(&body).ok();
        if status == StatusCode::NOT_FOUND {
            let message = envelope
                .map(|e| e.message())
                .unwrap_or_else(|| format!("record at {} not found", path));
            return Err(DdnsError::RecordNotFound(message).into());
        }
        if !status.is_success() || envelope.as_ref().map_or(false, Envelope::is_error) {
            return Err(DdnsError::Api {
                status: status.as_u16(),
                message: envelope.map_or_else(|| body.trim().to_string(), |e| e.message()),
            }
            .into());
        }

        Ok(outcome)
    }
}

//==============================================================================
// Tests
//==============================================================================
