//! Backend configuration for the GOOG1 signer.
//!
//! Provides [`GcpBackendConfig`], loaded from environment variables with
//! defaults that target the public XML API endpoint.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Configuration of the remote object-storage backend.
///
/// # Examples
///
/// ```
/// use ruststack_gcp_auth::config::GcpBackendConfig;
///
/// let config = GcpBackendConfig::default();
/// assert_eq!(config.endpoint, "storage.googleapis.com");
/// assert!(config.virtual_hosting);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GcpBackendConfig {
    /// Endpoint host requests are sent to; also the domain under which
    /// virtual-hosted bucket names are recognized.
    #[builder(default = String::from("storage.googleapis.com"))]
    pub endpoint: String,

    /// Whether `<bucket>.<endpoint>` hosts are treated as virtual-hosted buckets.
    #[builder(default = true)]
    pub virtual_hosting: bool,

    /// Default lifetime of pre-signed URLs, in seconds.
    #[builder(default = 900)]
    pub presign_expires_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GcpBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("storage.googleapis.com"),
            virtual_hosting: true,
            presign_expires_secs: 900,
            log_level: String::from("info"),
        }
    }
}

impl GcpBackendConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GCP_ENDPOINT` | `storage.googleapis.com` |
    /// | `GCP_VIRTUAL_HOSTING` | `true` |
    /// | `GCP_PRESIGN_EXPIRES` | `900` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GCP_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("GCP_VIRTUAL_HOSTING") {
            config.virtual_hosting = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GCP_PRESIGN_EXPIRES") {
            if let Ok(n) = v.parse::<u64>() {
                config.presign_expires_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The domain used to resolve virtual-hosted buckets, if enabled.
    #[must_use]
    pub fn virtual_host_domain(&self) -> Option<&str> {
        self.virtual_hosting.then_some(self.endpoint.as_str())
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = GcpBackendConfig::default();
        assert_eq!(config.endpoint, "storage.googleapis.com");
        assert!(config.virtual_hosting);
        assert_eq!(config.presign_expires_secs, 900);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_load_from_env() {
        let config = GcpBackendConfig::from_env();
        assert!(!config.endpoint.is_empty());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = GcpBackendConfig::builder()
            .endpoint("storage.example.test".into())
            .virtual_hosting(false)
            .presign_expires_secs(60)
            .build();

        assert_eq!(config.endpoint, "storage.example.test");
        assert!(!config.virtual_hosting);
        assert_eq!(config.presign_expires_secs, 60);
        assert_eq!(config.virtual_host_domain(), None);
    }

    #[test]
    fn test_should_expose_endpoint_as_virtual_host_domain() {
        let config = GcpBackendConfig::default();
        assert_eq!(config.virtual_host_domain(), Some("storage.googleapis.com"));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = GcpBackendConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("virtualHosting"));
        assert!(json.contains("presignExpiresSecs"));
        assert!(!json.contains("region"));
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
