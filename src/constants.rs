//! Common constants used throughout the zone-ddns application

//==============================================================================
// Provider API Constants
//==============================================================================

/// Base URL of the current (v2) ZoneID DNS API
pub const ZONE_API_V2_BASE: &str = "https://api.zone.eu/v2";

/// Base URL of the legacy (v1) ZoneID DNS API
pub const ZONE_API_V1_BASE: &str = "https://api.zone.eu/v1";

/// User agent string for outgoing requests
pub const USER_AGENT: &str = concat!("zone-ddns/", env!("CARGO_PKG_VERSION"));

/// DNS record type handled by the updater
pub const DNS_RECORD_TYPE_A: &str = "A";

/// Header the v2 API uses to explain a failed request
pub const HEADER_STATUS_MESSAGE: &str = "X-Status-Message";

/// Authentication header of the v1 API (`zoneid:token`)
pub const HEADER_ZONE_TOKEN: &str = "X-ZoneID-Token";

/// Response format header of the v1 API
pub const HEADER_RESPONSE_TYPE: &str = "X-ResponseType";

/// Body the v1 API returns for bad credentials
pub const V1_INVALID_TOKEN_BODY: &str = "invalid api token";

//==============================================================================
// External IP
//==============================================================================

/// Plain-text IP echo service
pub const DEFAULT_IP_URL: &str = "http://checkip.amazonaws.com";

//==============================================================================
// Files
//==============================================================================

/// Config file name, looked up beside the executable
pub const CONFIG_FILE_NAME: &str = "config.json";

/// State file name, looked up beside the executable
pub const STATE_FILE_NAME: &str = "current.json";

//==============================================================================
// Timeout Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// Environment variable name for the fully qualified domain name
pub const ENV_FQDN: &str = "ZONE_DDNS_FQDN";

/// Environment variable name for the API token
pub const ENV_TOKEN: &str = "ZONE_DDNS_TOKEN";

/// Environment variable name for the ZoneID account identifier
pub const ENV_ZONE_ID: &str = "ZONE_DDNS_ZONEID";
