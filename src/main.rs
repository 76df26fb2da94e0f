//! zone-ddns - one-shot dynamic DNS updater for ZoneID
//!
//! Architecture:
//! - Reads `config.json` beside the executable, flags override it
//! - Looks up the public IP through a plain-text echo service
//! - Skips the provider entirely when `current.json` already holds the pair
//! - Otherwise lists A records, updates or creates the match, records the result
//! - Meant to be run from a scheduler; every failure exits non-zero

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;
mod constants;
mod dns_provider;
mod error;
mod fqdn;
mod ip;
mod state;
mod updater;
mod zone_v1;
mod zone_v2;

use config::{default_config_path, redact_secrets, ApiVersion, Config, Overrides};
use constants::{ENV_FQDN, ENV_TOKEN, ENV_ZONE_ID};

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "zone-ddns")]
#[command(version, about = "Point a ZoneID A record at this machine's public IP")]
struct Args {
    /// Fully qualified domain name you want to update (e.g. api.zone.ee where api is the hostname and zone.ee is the domain)
    #[arg(long, env = ENV_FQDN, allow_hyphen_values = true)]
    fqdn: Option<String>,

    /// API access token
    #[arg(long, env = ENV_TOKEN, hide_env_values = true, allow_hyphen_values = true)]
    token: Option<String>,

    /// Your ZoneID
    #[arg(
        long = "zoneid",
        env = ENV_ZONE_ID,
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    zone_id: Option<String>,

    /// Provider API generation (v1 or v2)
    #[arg(long)]
    api: Option<ApiVersion>,

    /// Plain-text IP echo endpoint
    #[arg(long = "ip-url")]
    ip_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: config.json beside the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State file (default: current.json beside the executable)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(self) -> (PathBuf, Overrides) {
        let config_path = self.config.unwrap_or_else(default_config_path);
        let overrides = Overrides {
            fqdn: self.fqdn,
            token: self.token,
            zone_id: self.zone_id,
            api: self.api,
            ip_url: self.ip_url,
            timeout: self.timeout,
            state_path: self.state,
            verbose: self.verbose,
        };
        (config_path, overrides)
    }
}

/// Long flags that consume the following argument as their value
const VALUE_FLAGS: &[&str] = &[
    "fqdn", "token", "zoneid", "api", "ip-url", "timeout", "config", "state",
];

/// Rewrites Go-style `-fqdn value` / `-fqdn=value` into `--fqdn ...`
///
/// Single-character flags (`-h`, `-v`, `-c`) and anything after `--` are left alone.
/// The argument following a value-taking flag is its value and is never rewritten,
/// so `-token -abc` keeps `-abc` as the token.
fn normalize_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    let mut expect_value = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(s) => {
                expect_value = takes_separate_value(s);
                is_go_long_flag(s).then(|| OsString::from(format!("-{}", s)))
            }
            None => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

fn is_go_long_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split('=').next().unwrap_or_default();
    name.len() > 1 && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// `-c`, `-token` or `--token` with no inline `=value`
fn takes_separate_value(arg: &str) -> bool {
    if arg == "-c" {
        return true;
    }
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'));
    matches!(name, Some(name) if !name.contains('=') && VALUE_FLAGS.contains(&name))
}

/// Full error chain with the token and zone id masked
fn failure_message(e: &anyhow::Error, config: &Config) -> String {
    redact_secrets(&format!("{:#}", e), &config.token, &config.zone_id)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse_from(normalize_flags(std::env::args_os()));
    let (config_path, overrides) = args.overrides();

    let config = match Config::load(&config_path, overrides.clone()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(overrides.verbose);
            error!("{:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(config.verbose);

    match updater::run(&config).await {
        Ok(report) => println!("{}", report),
        Err(e) => {
            error!("{}", failure_message(&e, &config));
            std::process::exit(1);
        }
    }
}

//==============================================================================
// Tests
//==============================================================================
