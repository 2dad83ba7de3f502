use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tunables of the credential engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of visible history entries before FIFO eviction.
    pub history_capacity: usize,
    /// Upper bound on a single domain-bound resolution, in milliseconds.
    pub resolution_timeout_ms: u64,
    /// How long a fetched DID document snapshot stays fresh, in seconds.
    pub resolver_cache_ttl_secs: u64,
    /// Domain used when a `did:web` identity is generated without one.
    pub default_web_domain: String,
    /// Path segment used when a `did:web` identity is generated without one.
    pub default_web_segment: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            resolution_timeout_ms: 5_000,
            resolver_cache_ttl_secs: 300,
            default_web_domain: "example.com".into(),
            default_web_segment: "users".into(),
        }
    }
}

impl EngineConfig {
    /// Resolution timeout as a `Duration`.
    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    /// Resolver cache TTL as a `Duration`.
    pub fn resolver_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.resolver_cache_ttl_secs)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.history_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.resolution_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "resolution_timeout_ms must be positive".into(),
            ));
        }
        if self.default_web_domain.is_empty() || self.default_web_segment.is_empty() {
            return Err(CoreError::InvalidConfig(
                "default web domain and segment must be set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.resolution_timeout(), Duration::from_secs(5));
        assert_eq!(config.resolver_cache_ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"history_capacity": 10}"#).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.resolution_timeout_ms, 5_000);
        assert_eq!(config.default_web_domain, "example.com");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EngineConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = EngineConfig {
            resolution_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
