//! busctl configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `BUSCTL__`-prefixed environment variables
//! (e.g. `BUSCTL__API__BASE_URL`). Command-line flags are applied last by
//! the caller.

use std::path::Path;

use integration_bus::{BusApiConfig, MapConfig, NormalizationMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default configuration file looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "busctl";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend client settings
    #[serde(default)]
    pub api: BusApiConfig,

    /// Map SDK settings
    #[serde(default)]
    pub map: MapConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; without one, `busctl.toml` in the
    /// working directory is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("BUSCTL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        debug!(base_url = %app.api.base_url, mode = ?app.api.mode, "Configuration loaded");
        Ok(app)
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_overrides(mut self, url: Option<String>, raw: bool) -> Self {
        if let Some(url) = url {
            self.api.base_url = url;
        }
        if raw {
            self.api.mode = NormalizationMode::PassThrough;
        }
        self
    }
}
