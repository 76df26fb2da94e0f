//! Error types raised by the updater
//!
//! Components return `anyhow::Result` and raise these variants so the
//! top-level handler (and tests) can tell failures apart with `downcast_ref`.

use thiserror::Error;

/// Failure categories of a single update run
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Missing or invalid configuration, raised before any network activity
    #[error("{0}")]
    Config(String),

    /// DNS, connect or timeout failure on an HTTP call
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Provider rejected the credentials
    #[error("Invalid API token, unauthorized")]
    Unauthorized,

    /// Response body did not match the expected schema
    #[error("Unexpected response: {0}")]
    Protocol(String),

    /// Provider refused an update for a stale or unknown record id
    #[error("Unable to update DNS A record: {0}")]
    RecordNotFound(String),

    /// Matched record is flagged read-only by the provider
    #[error("DNS A record {0} does not allow modification")]
    RecordLocked(String),

    /// Any other non-success provider response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl DdnsError {
    pub fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }
}
