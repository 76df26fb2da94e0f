//! Update pipeline for a single run
//!
//! resolve IP → check state cache → list records → match → upsert → persist.
//! Every external failure ends the run; the state file is only written once
//! the provider is known to hold the current address.

use std::fmt;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{ApiVersion, Config};
use crate::dns_provider::{find_match, DnsProvider, Upsert};
use crate::error::DdnsError;
use crate::fqdn::{split_fqdn, FqdnParts};
use crate::ip::IpResolver;
use crate::state::StateCache;
use crate::zone_v1::ZoneV1Client;
use crate::zone_v2::ZoneV2Client;

//==============================================================================
// Outcome
//==============================================================================

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State file already matched; the provider was not contacted
    CacheHit,
    /// Provider record already pointed at the current IP
    AlreadyCurrent,
    /// Existing record was pointed at the current IP
    Updated,
    /// No matching record existed, one was created
    Created,
}

/// Operator-facing summary of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub fqdn: String,
    pub ip: String,
    pub outcome: Outcome,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::CacheHit | Outcome::AlreadyCurrent => write!(
                f,
                "IP already matches for FQDN: {} ({}). No update needed.",
                self.fqdn, self.ip
            ),
            Outcome::Updated | Outcome::Created => {
                write!(f, "{} was successfully set to {}", self.fqdn, self.ip)
            }
        }
    }
}

//==============================================================================
// Updater
//==============================================================================

/// Keeps one A record in sync with the caller's public IP
pub struct Updater<P> {
    fqdn: String,
    parts: FqdnParts,
    resolver: IpResolver,
    provider: P,
    state: StateCache,
}

impl<P: DnsProvider> Updater<P> {
    pub fn new(fqdn: &str, resolver: IpResolver, provider: P, state: StateCache) -> Self {
        Self {
            fqdn: fqdn.to_string(),
            parts: split_fqdn(fqdn),
            resolver,
            provider,
            state,
        }
    }

    /// Runs the pipeline once
    pub async fn sync(&self) -> Result<Report> {
        let ip = self.resolver.resolve().await?;
        info!("Current IP: {}", ip);

        if let Some(cached) = self.state.read() {
            if cached.matches(&self.fqdn, &ip) {
                info!("State file matches (updated {}), skipping provider", cached.updated);
                return Ok(self.report(ip, Outcome::CacheHit));
            }
            debug!("State file holds {} -> {}", cached.fqdn, cached.ip);
        }

        let records = self.provider.list_records().await?;
        let key = self.provider.match_key(&self.fqdn, &self.parts);
        let matched = find_match(&records, &key);

        match matched {
            Some(record) => {
                info!("Found {}", record);
                if record.destination == ip {
                    self.persist(&ip);
                    return Ok(self.report(ip, Outcome::AlreadyCurrent));
                }
                if !record.allow_modify {
                    return Err(DdnsError::RecordLocked(self.fqdn.clone()).into());
                }
            }
            None => info!("No A record named '{}', creating one", key),
        }

        let outcome = match self
            .provider
            .upsert_record(matched, &self.fqdn, &self.parts, &ip)
            .await?
        {
            Upsert::Updated => Outcome::Updated,
            Upsert::Created => Outcome::Created,
        };

        self.persist(&ip);
        Ok(self.report(ip, outcome))
    }

    /// Failure here is logged only, the provider already holds `ip`
    fn persist(&self, ip: &str) {
        if let Err(e) = self.state.write(&self.fqdn, ip, Utc::now()) {
            warn!(
                "Failed to write state file {}: {:#}",
                self.state.path().display(),
                e
            );
        }
    }

    fn report(&self, ip: String, outcome: Outcome) -> Report {
        Report {
            fqdn: self.fqdn.clone(),
            ip,
            outcome,
        }
    }
}

/// Builds the components described by `config` and runs the pipeline once
pub async fn run(config: &Config) -> Result<Report> {
    let parts = split_fqdn(&config.fqdn);
    info!(
        "Syncing {} (host: '{}', domain: {}, api: {})",
        config.fqdn, parts.host, parts.domain, config.api
    );

    let resolver = IpResolver::new(&config.ip_url, config.timeout)?;
    let state = StateCache::new(&config.state_path);

    match config.api {
        ApiVersion::V2 => {
            let provider =
                ZoneV2Client::new(&config.zone_id, &config.token, &parts.domain, config.timeout)?;
            debug!("Using provider {}", provider.name());
            Updater::new(&config.fqdn, resolver, provider, state).sync().await
        }
        ApiVersion::V1 => {
            let provider =
                ZoneV1Client::new(&config.zone_id, &config.token, &parts.domain, config.timeout)?;
            debug!("Using provider {}", provider.name());
            Updater::new(&config.fqdn, resolver, provider, state).sync().await
        }
    }
}

//==============================================================================
// Tests
//==============================================================================
