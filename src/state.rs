//! Last-applied state cache
//!
//! A single JSON document remembering the FQDN/IP pair most recently
//! confirmed at the provider:
//!
//! ```json
//! {"fqdn": "home.example.com", "ip": "203.0.113.9", "updated": "2026-10-16T08:00:00Z"}
//! ```
//!
//! The file is only an optimization that saves a provider round trip, so a
//! missing or unreadable file simply means "no prior state".

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// FQDN/IP pair last confirmed at the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedState {
    pub fqdn: String,
    pub ip: String,
    /// When the pair was written, serialized as RFC 3339 UTC
    pub updated: DateTime<Utc>,
}

impl CachedState {
    /// True when this entry already describes `fqdn` pointing at `ip`
    pub fn matches(&self, fqdn: &str, ip: &str) -> bool {
        self.fqdn == fqdn && self.ip == ip
    }
}

/// File-backed store for [`CachedState`]
#[derive(Debug, Clone)]
pub struct StateCache {
    path: PathBuf,
}

impl StateCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached entry, or `None` when absent or unparsable
    pub fn read(&self) -> Option<CachedState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No state file at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Ignoring unreadable state file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrites the state file with `{fqdn, ip, updated: now}`
    ///
    /// The document is written to a sibling temp file and renamed into place,
    /// so readers never observe a half-written file.
    pub fn write(&self, fqdn: &str, ip: &str, now: DateTime<Utc>) -> Result<()> {
        let state = CachedState {
            fqdn: fqdn.to_string(),
            ip: ip.to_string(),
            updated: now,
        };
        let content = serde_json::to_vec(&state).context("Failed to encode state")?;

        let tmp_path = self.tmp_path();
        if let Err(e) = self.replace_with(&tmp_path, &content) {
            // no stray temp file on failure
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!("State written to {}", self.path.display());
        Ok(())
    }

    fn replace_with(&self, tmp_path: &Path, content: &[u8]) -> Result<()> {
        let mut file = open_for_write(tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
        drop(file);

        fs::rename(tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(unix)]
fn open_for_write(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o660)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

//==============================================================================
// Tests
//==============================================================================
