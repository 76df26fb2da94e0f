//! DNS provider abstraction layer
//!
//! Both generations of the ZoneID API expose the same two operations, so
//! the update pipeline is written once against this trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::fqdn::FqdnParts;

//==============================================================================
// Types
//==============================================================================

/// An address record as reported by the provider
///
/// Always fetched fresh; the provider owns record identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider identifier, empty when the record does not exist yet
    pub id: String,
    /// Name the record is matched on (full name or host prefix, per provider)
    pub name: String,
    /// Current IP the record points at
    pub destination: String,
    /// Provider allows updating this record
    pub allow_modify: bool,
    /// Provider allows deleting this record
    pub allow_delete: bool,
    /// Provider's own URL for the record, echoed back on update (empty if none)
    pub resource_url: String,
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A {} -> {} (ID: {}, modify: {})",
            self.name, self.destination, self.id, self.allow_modify
        )
    }
}

/// Result of a successful write to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Created,
}

//==============================================================================
// Trait
//==============================================================================

/// Record management operations of a DNS provider
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// The value a record's `name` must equal to belong to `fqdn`
    ///
    /// The v2 API reports full names, the v1 API host prefixes.
    fn match_key(&self, fqdn: &str, parts: &FqdnParts) -> String;

    /// Lists every A record of the configured domain
    ///
    /// # Errors
    ///
    /// Transport failures, rejected credentials and unparsable bodies.
    async fn list_records(&self) -> anyhow::Result<Vec<DnsRecord>>;

    /// Points `existing` at `ip`, or creates a record when `existing` is `None`
    async fn upsert_record(
        &self,
        existing: Option<&DnsRecord>,
        fqdn: &str,
        parts: &FqdnParts,
        ip: &str,
    ) -> anyhow::Result<Upsert>;
}

/// Reads `null` as the type's default, like a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads `null` as `true`; permission flags default to allowed
pub(crate) fn null_as_writable<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// First record whose name equals `key`, in provider order
pub fn find_match<'a>(records: &'a [DnsRecord], key: &str) -> Option<&'a DnsRecord> {
    records.iter().find(|record| record.name == key)
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, destination: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: name.to_string(),
            destination: destination.to_string(),
            allow_modify: true,
            allow_delete: true,
            resource_url: String::new(),
        }
    }

    #[test]
    fn test_find_match_exact_name() {
        let records = vec![
            record("1", "www.example.com", "203.0.113.1"),
            record("42", "home.example.com", "203.0.113.2"),
        ];
        let found = find_match(&records, "home.example.com").unwrap();
        assert_eq!(found.id, "42");
    }

    #[test]
    fn test_find_match_first_wins_on_duplicates() {
        let records = vec![
            record("7", "home", "203.0.113.1"),
            record("8", "home", "203.0.113.2"),
        ];
        assert_eq!(find_match(&records, "home").unwrap().id, "7");
    }

    #[test]
    fn test_find_match_none() {
        let records = vec![record("1", "www.example.com", "203.0.113.1")];
        assert!(find_match(&records, "home.example.com").is_none());
        assert!(find_match(&[], "home.example.com").is_none());
    }

    #[test]
    fn test_find_match_is_case_sensitive() {
        let records = vec![record("1", "Home.example.com", "203.0.113.1")];
        assert!(find_match(&records, "home.example.com").is_none());
    }

    #[test]
    fn test_dns_record_display() {
        let s = record("42", "home.example.com", "203.0.113.1").to_string();
        assert!(s.contains("home.example.com"));
        assert!(s.contains("203.0.113.1"));
        assert!(s.contains("42"));
    }
}
