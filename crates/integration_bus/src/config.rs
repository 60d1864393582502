//! Client configuration

use serde::{Deserialize, Serialize};

/// How successful responses are turned into payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Unwrap `content`/`data` and reject bodies carrying a failure code
    #[default]
    Unwrap,
    /// Hand the body to the caller unchanged; the caller inspects `success`/`code`
    PassThrough,
}

/// Configuration for the bus system backend client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusApiConfig {
    /// Backend origin, e.g. `http://localhost:8080`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds, applied to every call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Normalization policy for successful responses
    #[serde(default)]
    pub mode: NormalizationMode,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("busctl/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BusApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            mode: NormalizationMode::default(),
            user_agent: default_user_agent(),
        }
    }
}

impl BusApiConfig {
    /// Create a configuration suitable for testing against a local mock server
    #[must_use]
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: 1000,
            ..Default::default()
        }
    }

    /// Same configuration with a different normalization policy
    #[must_use]
    pub const fn with_mode(mut self, mode: NormalizationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("base_url is not a valid URL: {e}"))?;
        if url.cannot_be_a_base() {
            return Err("base_url must be an absolute http(s) origin".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Configuration for the third-party map SDK loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map provider access key (`ak`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// SDK script endpoint
    #[serde(default = "default_sdk_url")]
    pub sdk_url: String,

    /// SDK version requested from the provider
    #[serde(default = "default_sdk_version")]
    pub version: String,

    /// Renderer flavour (`webgl` for the GL build)
    #[serde(default = "default_sdk_kind")]
    pub kind: String,

    /// Download timeout in milliseconds
    #[serde(default = "default_sdk_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_sdk_url() -> String {
    "https://api.map.baidu.com/api".to_string()
}

fn default_sdk_version() -> String {
    "1.0".to_string()
}

fn default_sdk_kind() -> String {
    "webgl".to_string()
}

const fn default_sdk_timeout_ms() -> u64 {
    10_000
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            sdk_url: default_sdk_url(),
            version: default_sdk_version(),
            kind: default_sdk_kind(),
            timeout_ms: default_sdk_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BusApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.mode, NormalizationMode::Unwrap);
        assert!(config.user_agent.starts_with("busctl/"));
    }

    #[test]
    fn test_testing_config() {
        let config = BusApiConfig::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.timeout_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_mode() {
        let config = BusApiConfig::default().with_mode(NormalizationMode::PassThrough);
        assert_eq!(config.mode, NormalizationMode::PassThrough);
    }

    #[test]
    fn test_validation_empty_base_url() {
        let config = BusApiConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_relative_base_url() {
        let config = BusApiConfig {
            base_url: "/api".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = BusApiConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_deserialization() {
        let config: BusApiConfig = serde_json::from_str(r#"{ "mode": "pass_through" }"#).unwrap();
        assert_eq!(config.mode, NormalizationMode::PassThrough);
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_map_config_defaults() {
        let config = MapConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.sdk_url, "https://api.map.baidu.com/api");
        assert_eq!(config.version, "1.0");
        assert_eq!(config.kind, "webgl");
    }
}
