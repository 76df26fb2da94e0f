//! Configuration module for zone-ddns
//!
//! This module merges the optional JSON config file with command-line flags
//! and validates the result.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_IP_URL, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
    STATE_FILE_NAME,
};
use crate::error::DdnsError;

const MISSING_REQUIRED: &str = "At least one of the required flag (-fqdn, -token, -zoneid) is missing! Append flag -h to get help for this command";

//==============================================================================
// Types
//==============================================================================

/// Which generation of the provider API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Legacy form-encoded API with header authentication
    V1,
    /// Current JSON API with basic authentication
    #[default]
    V2,
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" | "legacy" => Ok(Self::V1),
            "2" | "v2" => Ok(Self::V2),
            _ => Err(format!("Invalid api version: '{}'. Use: v1|v2", value)),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Values given explicitly on the command line (or through their env vars)
///
/// Every field set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub fqdn: Option<String>,
    pub token: Option<String>,
    pub zone_id: Option<String>,
    pub api: Option<ApiVersion>,
    pub ip_url: Option<String>,
    pub timeout: Option<u64>,
    pub state_path: Option<PathBuf>,
    pub verbose: bool,
}

/// Resolved parameters for one run
///
/// Built once by [`Config::load`] and passed by reference afterwards.
/// The token and zone id are wiped from memory on drop.
#[derive(Clone)]
pub struct Config {
    /// Record to keep pointed at this machine, e.g. `home.example.com`
    pub fqdn: String,
    /// API access token
    pub token: Zeroizing<String>,
    /// ZoneID account identifier
    pub zone_id: Zeroizing<String>,
    /// Provider API generation
    pub api: ApiVersion,
    /// IP echo endpoint
    pub ip_url: String,
    /// Client-side timeout for every HTTP call
    pub timeout: Duration,
    /// Location of the last-applied state file
    pub state_path: PathBuf,
    /// Enable debug logging
    pub verbose: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("fqdn", &self.fqdn)
            .field("token", &"***REDACTED***")
            .field("zone_id", &"***REDACTED***")
            .field("api", &self.api)
            .field("ip_url", &self.ip_url)
            .field("timeout", &self.timeout)
            .field("state_path", &self.state_path)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// JSON config file structure
///
/// Only `fqdn`, `zoneid` and `token` are common; the rest are optional extras.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    fqdn: Option<String>,
    zoneid: Option<String>,
    token: Option<String>,
    api: Option<String>,
    ip_url: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
}

//==============================================================================
// Loading
//==============================================================================

impl Config {
    /// Loads the config file (if any) and applies the overrides on top
    ///
    /// A missing or malformed file is ignored. Fails with
    /// [`DdnsError::Config`] when fqdn, token or zone id ends up empty.
    pub fn load(config_path: &Path, overrides: Overrides) -> Result<Self> {
        let file = read_file_config(config_path);

        let api = match overrides.api {
            Some(api) => api,
            None => match file.api.as_deref() {
                Some(v) => v.parse().map_err(DdnsError::Config)?,
                None => ApiVersion::default(),
            },
        };

        let config = Self {
            fqdn: pick(overrides.fqdn, file.fqdn),
            token: Zeroizing::new(pick(overrides.token, file.token)),
            zone_id: Zeroizing::new(pick(overrides.zone_id, file.zoneid)),
            api,
            ip_url: overrides
                .ip_url
                .or(file.ip_url)
                .unwrap_or_else(|| DEFAULT_IP_URL.to_string()),
            timeout: Duration::from_secs(
                overrides
                    .timeout
                    .or(file.timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            state_path: overrides
                .state_path
                .unwrap_or_else(|| base_dir().join(STATE_FILE_NAME)),
            verbose: overrides.verbose || file.verbose.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fqdn.is_empty() || self.token.is_empty() || self.zone_id.is_empty() {
            return Err(DdnsError::Config(MISSING_REQUIRED.to_string()).into());
        }

        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(DdnsError::Config(format!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, timeout_secs
            ))
            .into());
        }

        Ok(())
    }
}

/// Explicit value first (even an empty one), then the file value, else empty
fn pick(flag: Option<String>, file: Option<String>) -> String {
    flag.or(file).unwrap_or_default()
}

fn read_file_config(path: &Path) -> FileConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No config file at {}: {}", path.display(), e);
            return FileConfig::default();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        debug!("Ignoring malformed config file {}: {}", path.display(), e);
        FileConfig::default()
    })
}

/// Directory holding the executable, falling back to the working directory
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    base_dir().join(CONFIG_FILE_NAME)
}

/// Replaces occurrences of the token and zone id in a log message
#[must_use]
pub fn redact_secrets(message: &str, token: &str, zone_id: &str) -> String {
    let mut sanitized = message.to_string();

    if !token.is_empty() {
        sanitized = sanitized.replace(token, "***REDACTED***");
    }
    if !zone_id.is_empty() {
        sanitized = sanitized.replace(zone_id, "***REDACTED***");
    }

    sanitized
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    fn missing_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");
        (dir, path)
    }

    fn flags(fqdn: &str, token: &str, zone_id: &str) -> Overrides {
        Overrides {
            fqdn: Some(fqdn.to_string()),
            token: Some(token.to_string()),
            zone_id: Some(zone_id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn config_load_from_file() {
        let (_dir, path) = write_config(
            r#"{"fqdn": "home.example.com", "zoneid": "Z", "token": "T"}"#,
        );

        let cfg = Config::load(&path, Overrides::default()).expect("config load");
        assert_eq!(cfg.fqdn, "home.example.com");
        assert_eq!(cfg.token.as_str(), "T");
        assert_eq!(cfg.zone_id.as_str(), "Z");
        assert_eq!(cfg.api, ApiVersion::V2);
        assert_eq!(cfg.ip_url, DEFAULT_IP_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!cfg.verbose);
    }

    #[test]
    fn config_flags_override_file() {
        let (_dir, path) = write_config(
            r#"{"fqdn": "home.example.com", "zoneid": "Z", "token": "T"}"#,
        );

        let cfg = Config::load(&path, flags("office.example.com", "T2", "Z2")).expect("config load");
        assert_eq!(cfg.fqdn, "office.example.com");
        assert_eq!(cfg.token.as_str(), "T2");
        assert_eq!(cfg.zone_id.as_str(), "Z2");
    }

    #[test]
    fn config_partial_flags_fill_from_file() {
        let (_dir, path) = write_config(
            r#"{"fqdn": "home.example.com", "zoneid": "Z", "token": "T"}"#,
        );

        let overrides = Overrides {
            token: Some("fresh".to_string()),
            ..Default::default()
        };
        let cfg = Config::load(&path, overrides).expect("config load");
        assert_eq!(cfg.fqdn, "home.example.com");
        assert_eq!(cfg.token.as_str(), "fresh");
        assert_eq!(cfg.zone_id.as_str(), "Z");
    }

    #[test]
    fn config_empty_flag_clears_file_value() {
        let (_dir, path) = write_config(
            r#"{"fqdn": "home.example.com", "zoneid": "Z", "token": "T"}"#,
        );

        let overrides = Overrides {
            token: Some(String::new()),
            ..Default::default()
        };
        let err = Config::load(&path, overrides).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdnsError>(),
            Some(DdnsError::Config(_))
        ));
        assert!(err.to_string().contains("-token"));
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let (_dir, path) = missing_path();
        let cfg = Config::load(&path, flags("home.example.com", "tok-secret-1", "zone-secret-2"))
            .expect("config load");

        let debug = format!("{:?}", cfg);
        assert!(debug.contains("home.example.com"));
        assert!(debug.contains("***REDACTED***"));
        assert!(!debug.contains("tok-secret-1"));
        assert!(!debug.contains("zone-secret-2"));
    }

    #[test]
    fn config_missing_file_uses_flags_only() {
        let (_dir, path) = missing_path();
        let cfg = Config::load(&path, flags("home.example.com", "T", "Z")).expect("config load");
        assert_eq!(cfg.fqdn, "home.example.com");
    }

    #[test]
    fn config_malformed_file_is_ignored() {
        let (_dir, path) = write_config("{ this is not json");
        let cfg = Config::load(&path, flags("home.example.com", "T", "Z")).expect("config load");
        assert_eq!(cfg.token.as_str(), "T");
    }

    #[test]
    fn config_missing_required_fields() {
        let (_dir, path) = missing_path();
        for overrides in [
            flags("", "T", "Z"),
            flags("home.example.com", "", "Z"),
            flags("home.example.com", "T", ""),
            Overrides::default(),
        ] {
            let err = Config::load(&path, overrides).expect_err("missing required");
            assert!(matches!(
                err.downcast_ref::<DdnsError>(),
                Some(DdnsError::Config(_))
            ));
            assert!(format!("{err}").contains("-fqdn, -token, -zoneid"));
        }
    }

    #[test]
    fn config_extended_file_keys() {
        let (_dir, path) = write_config(
            r#"{
                "fqdn": "home.example.com",
                "zoneid": "Z",
                "token": "T",
                "api": "v1",
                "ip_url": "http://127.0.0.1:9/ip",
                "timeout": 30,
                "verbose": true
            }"#,
        );

        let cfg = Config::load(&path, Overrides::default()).expect("config load");
        assert_eq!(cfg.api, ApiVersion::V1);
        assert_eq!(cfg.ip_url, "http://127.0.0.1:9/ip");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.verbose);
    }

    #[test]
    fn config_invalid_api_in_file() {
        let (_dir, path) = write_config(
            r#"{"fqdn": "home.example.com", "zoneid": "Z", "token": "T", "api": "v9"}"#,
        );
        let err = Config::load(&path, Overrides::default()).expect_err("bad api");
        assert!(format!("{err}").contains("Invalid api version"));
    }

    #[test]
    fn config_timeout_boundary_values() {
        let (_dir, path) = missing_path();

        for (secs, ok) in [(0, false), (1, true), (300, true), (301, false)] {
            let overrides = Overrides {
                timeout: Some(secs),
                ..flags("home.example.com", "T", "Z")
            };
            let result = Config::load(&path, overrides);
            assert_eq!(result.is_ok(), ok, "timeout {secs}");
            if let Err(err) = result {
                assert!(format!("{err}").contains("timeout"));
            }
        }
    }

    #[test]
    fn config_state_path_override() {
        let (dir, path) = missing_path();
        let state = dir.path().join("state.json");
        let overrides = Overrides {
            state_path: Some(state.clone()),
            ..flags("home.example.com", "T", "Z")
        };
        let cfg = Config::load(&path, overrides).expect("config load");
        assert_eq!(cfg.state_path, state);
    }

    #[test]
    fn config_default_state_path_is_beside_executable() {
        let (_dir, path) = missing_path();
        let cfg = Config::load(&path, flags("home.example.com", "T", "Z")).expect("config load");
        assert_eq!(cfg.state_path, base_dir().join(STATE_FILE_NAME));
    }

    #[test]
    fn parse_api_version_valid_and_invalid() {
        assert_eq!("v1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!("V2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);
        assert_eq!("legacy".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert!("bogus".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_redact_secrets() {
        let message = "auth secret_token_123 for zone zone_id_456";
        let redacted = redact_secrets(message, "secret_token_123", "zone_id_456");
        assert!(!redacted.contains("secret_token_123"));
        assert!(!redacted.contains("zone_id_456"));
        assert!(redacted.contains("***REDACTED***"));
    }

    #[test]
    fn test_redact_secrets_empty() {
        let message = "nothing to hide";
        assert_eq!(redact_secrets(message, "", ""), message);
    }
}
