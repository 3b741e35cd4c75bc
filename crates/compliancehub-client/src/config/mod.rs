//! Client configuration.
//!
//! Values are resolved in this order, later sources winning:
//! 1. built-in defaults
//! 2. a YAML config file, validated against the embedded JSON Schema
//! 3. environment variables (`COMPLIANCEHUB_BASE_URL`, `COMPLIANCEHUB_COMPANY_ID`,
//!    `COMPLIANCEHUB_TIMEOUT`)
//! 4. explicit values set on [`ApiClientBuilder`](crate::ApiClientBuilder)
//!
//! Durations are written the human way: `"30s"`, `"2m"`, `"1h 30m"`.

mod schema;

pub use schema::validate_config_schema;

use compliancehub_core::CompanyId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ClientError;

pub const ENV_BASE_URL: &str = "COMPLIANCEHUB_BASE_URL";
pub const ENV_COMPANY_ID: &str = "COMPLIANCEHUB_COMPANY_ID";
pub const ENV_TIMEOUT: &str = "COMPLIANCEHUB_TIMEOUT";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Connection and caching settings for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; resource paths are joined onto it
    pub base_url: String,

    /// Per-request timeout
    #[serde(with = "duration_human")]
    pub timeout: Duration,

    pub user_agent: String,

    /// Tenant to address when the session does not pick one
    pub company_id: Option<CompanyId>,

    pub cache: CacheConfig,
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Upper bound on cached GET responses
    pub max_entries: u64,

    /// How long a cached response stays valid
    #[serde(with = "duration_human")]
    pub ttl: Duration,
}

mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("compliancehub-client/", env!("CARGO_PKG_VERSION")).to_string(),
            company_id: None,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
            ttl: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Parse a YAML config document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ClientError> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| ClientError::Config(format!("invalid YAML: {}", e)))?;

        // An empty file parses to null
        let json = match doc {
            serde_yaml::Value::Null => serde_json::Value::Object(Default::default()),
            other => serde_json::to_value(other)
                .map_err(|e| ClientError::Config(format!("unsupported YAML value: {}", e)))?,
        };

        validate_config_schema(&json).map_err(|errors| ClientError::Config(errors.join("; ")))?;

        let config: ClientConfig =
            serde_json::from_value(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(id) = lookup(ENV_COMPANY_ID).filter(|v| !v.trim().is_empty()) {
            self.company_id = Some(CompanyId::new(id.trim()));
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            self.timeout = humantime::parse_duration(timeout.trim()).map_err(|e| {
                ClientError::Config(format!("{} must be a duration like 30s: {}", ENV_TIMEOUT, e))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field rules the schema cannot express.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::Config(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be positive".to_string()));
        }
        if self.cache.enabled && self.cache.ttl.is_zero() {
            return Err(ClientError::Config("cache.ttl must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_human_durations() {
        let config = ClientConfig::from_yaml(
            r#"
base_url: https://grc.example.com/api
timeout: 1m 30s
cache:
  ttl: 5m
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://grc.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        // untouched keys keep their defaults
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ClientConfig::from_yaml("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_schema_violation_names_the_key() {
        let err = ClientConfig::from_yaml("cache:\n  max_entries: -3\n").unwrap_err();
        let ClientError::Config(msg) = err else {
            panic!("expected config error");
        };
        assert!(msg.contains("/cache/max_entries"), "{}", msg);
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ClientConfig::from_yaml("base_url: http://file.local/api\n")
            .unwrap()
            .with_env(env(&[
                (ENV_BASE_URL, "https://env.example.com/api"),
                (ENV_COMPANY_ID, "c-42"),
                (ENV_TIMEOUT, "10s"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "https://env.example.com/api");
        assert_eq!(config.company_id, Some(CompanyId::new("c-42")));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = ClientConfig::default()
            .with_env(env(&[(ENV_BASE_URL, "  ")]))
            .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_rejects_bad_url_and_timeout() {
        assert!(ClientConfig::default()
            .with_env(env(&[(ENV_BASE_URL, "localhost:8000")]))
            .is_err());
        assert!(ClientConfig::default()
            .with_env(env(&[(ENV_TIMEOUT, "eventually")]))
            .is_err());
    }

    #[test]
    fn test_serialized_durations_round_trip_through_yaml() {
        let mut config = ClientConfig::default();
        config.timeout = Duration::from_secs(45);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("timeout: 45s"), "{}", yaml);
        assert_eq!(ClientConfig::from_yaml(&yaml).unwrap(), config);
    }
}
