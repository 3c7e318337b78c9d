//! Configuration for the reconciliation client and resolvers.
//!
//! Built programmatically or from the environment. Every field can be
//! overridden with a `RECON_` variable:
//! - `RECON_ENDPOINT` → `endpoint`
//! - `RECON_API_KEY` → `api_key`
//! - `RECON_CHUNK_SIZE` → `chunk_size`
//! - `RECON_TIMEOUT_MS` → `timeout`
//! - `RECON_ID_PROPERTIES` (comma separated) → `id_properties`

use std::time::Duration;

use crate::error::{ReconError, ValidationError};
use crate::vocabulary::EXTERNAL_ID_PROPERTIES;

/// Default reconciliation service base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.datacommons.org";

/// Default maximum number of keys per outbound call.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reconciliation client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconConfig {
    /// Base URL of the reconciliation service.
    pub endpoint: String,
    /// API key sent as `X-API-Key`, if any.
    pub api_key: Option<String>,
    /// Maximum number of keys per outbound call.
    pub chunk_size: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// External id properties inspected by the entity resolver, in priority order.
    pub id_properties: Vec<String>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: DEFAULT_TIMEOUT,
            id_properties: EXTERNAL_ID_PROPERTIES.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl ReconConfig {
    /// Defaults with `RECON_*` overrides from the process environment, validated.
    pub fn from_env() -> Result<Self, ReconError> {
        Self::default()
            .with_overrides(|key| std::env::var(key).ok())?
            .validate()
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ReconError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(endpoint) = get("RECON_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(api_key) = get("RECON_API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(raw) = get("RECON_CHUNK_SIZE") {
            self.chunk_size = parse_field("chunk_size", &raw)?;
        }
        if let Some(raw) = get("RECON_TIMEOUT_MS") {
            self.timeout = Duration::from_millis(parse_field("timeout", &raw)?);
        }
        if let Some(raw) = get("RECON_ID_PROPERTIES") {
            self.id_properties = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        Ok(self)
    }

    /// Sets the chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Checks the configuration.
    pub fn validate(self) -> Result<Self, ReconError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::ZeroChunkSize.into());
        }
        if self.endpoint.trim().is_empty() {
            return Err(ValidationError::EmptyEndpoint.into());
        }
        if self.timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout.into());
        }
        if self.id_properties.is_empty() {
            return Err(ValidationError::NoIdProperties.into());
        }
        Ok(self)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ReconError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        ReconError::from(ValidationError::InvalidField {
            field: field.to_string(),
            reason: format!("'{raw}': {e}"),
        })
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ReconConfig::default().validate().unwrap();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.api_key.is_none());
        assert_eq!(config.id_properties.first().map(String::as_str), Some("isoCode"));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let err = ReconConfig::default().with_chunk_size(0).validate().unwrap_err();
        assert!(matches!(err, ReconError::Validation(ValidationError::ZeroChunkSize)));
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let err = ReconConfig::default().with_endpoint("  ").validate().unwrap_err();
        assert!(matches!(err, ReconError::Validation(ValidationError::EmptyEndpoint)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ReconConfig {
            timeout: Duration::ZERO,
            ..ReconConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReconError::Validation(ValidationError::ZeroTimeout)));
    }

    #[test]
    fn test_validate_rejects_no_id_properties() {
        let config = ReconConfig {
            id_properties: Vec::new(),
            ..ReconConfig::default()
        };
        assert!(config.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_overrides_apply() {
        let config = ReconConfig::default()
            .with_overrides(lookup(&[
                ("RECON_ENDPOINT", "http://localhost:8080"),
                ("RECON_API_KEY", "secret"),
                ("RECON_CHUNK_SIZE", "25"),
                ("RECON_TIMEOUT_MS", "1500"),
                ("RECON_ID_PROPERTIES", "geoId, wikidataId,,"),
            ]))
            .unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.id_properties, vec!["geoId".to_string(), "wikidataId".to_string()]);
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = ReconConfig::default()
            .with_overrides(lookup(&[("RECON_ENDPOINT", ""), ("RECON_API_KEY", "  ")]))
            .unwrap();
        assert_eq!(config, ReconConfig::default());
    }

    #[test]
    fn test_bad_override_is_validation_error() {
        let err = ReconConfig::default()
            .with_overrides(lookup(&[("RECON_CHUNK_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(format!("{err}").contains("chunk_size"));
    }
}
