//! Map SDK loader
//!
//! Downloads the third-party map SDK script at most once per loader. Callers
//! racing on a load share the single in-flight request and its outcome,
//! success or failure. A failed load leaves the loader empty so the next
//! call starts over.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::MapConfig;
use crate::error::MapLoadError;

/// A loaded map SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSdk {
    /// Where the script was fetched from (access key included)
    pub source: Url,
    /// Script source text
    pub script: String,
}

/// Loads the map SDK once and hands out the cached instance afterwards
#[derive(Debug)]
pub struct MapSdkLoader {
    client: Client,
    config: MapConfig,
    sdk: OnceCell<Arc<MapSdk>>,
    /// Held for the duration of a fetch; keeps the last failure
    in_flight: Mutex<Option<MapLoadError>>,
    /// Number of finished fetches
    attempts: AtomicU64,
}

impl MapSdkLoader {
    /// Create a loader; nothing is fetched until [`MapSdkLoader::load`]
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &MapConfig) -> Result<Self, MapLoadError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| MapLoadError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            sdk: OnceCell::new(),
            in_flight: Mutex::new(None),
            attempts: AtomicU64::new(0),
        })
    }

    /// Whether the SDK has been loaded successfully
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.sdk.initialized()
    }

    /// Load the SDK, or return the instance loaded earlier
    ///
    /// Callers arriving while a fetch is running wait for it and receive
    /// its outcome instead of starting another one.
    ///
    /// # Errors
    ///
    /// Returns an error if no access key is configured, or if the script
    /// cannot be downloaded.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<MapSdk>, MapLoadError> {
        if let Some(sdk) = self.sdk.get() {
            return Ok(Arc::clone(sdk));
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.in_flight.lock().await;

        if let Some(sdk) = self.sdk.get() {
            return Ok(Arc::clone(sdk));
        }
        let finished_while_waiting = self.attempts.load(Ordering::Acquire) != seen;
        if let Some(err) = last_failure.as_ref().filter(|_| finished_while_waiting) {
            debug!(error = %err, "Sharing failed map SDK load");
            return Err(err.clone());
        }

        let outcome = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(sdk) => {
                *last_failure = None;
                Ok(Arc::clone(self.sdk.get_or_init(|| async move { sdk }).await))
            },
            Err(err) => {
                *last_failure = Some(err.clone());
                Err(err)
            },
        }
    }

    /// SDK script URL for the configured key
    ///
    /// # Errors
    ///
    /// Returns an error if no access key is configured or the SDK URL is invalid.
    pub fn source_url(&self) -> Result<Url, MapLoadError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(MapLoadError::MissingApiKey)?;

        let mut url =
            Url::parse(&self.config.sdk_url).map_err(|e| MapLoadError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("v", &self.config.version)
            .append_pair("type", &self.config.kind)
            .append_pair("ak", api_key);
        Ok(url)
    }

    async fn fetch(&self) -> Result<Arc<MapSdk>, MapLoadError> {
        let source = self.source_url()?;
        debug!(sdk_url = %self.config.sdk_url, "Fetching map SDK");

        let response = self
            .client
            .get(source.clone())
            .send()
            .await
            .map_err(|e| MapLoadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapLoadError::HttpStatus(status.as_u16()));
        }

        let script = response
            .text()
            .await
            .map_err(|e| MapLoadError::Network(e.to_string()))?;

        info!(bytes = script.len(), "Map SDK loaded");
        Ok(Arc::new(MapSdk { source, script }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> MapConfig {
        MapConfig {
            api_key: key.map(str::to_string),
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_source_url() {
        let loader = MapSdkLoader::new(&config_with_key(Some("abc123"))).unwrap();
        let url = loader.source_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.map.baidu.com/api?v=1.0&type=webgl&ak=abc123"
        );
    }

    #[test]
    fn test_source_url_requires_key() {
        let loader = MapSdkLoader::new(&config_with_key(None)).unwrap();
        assert!(matches!(
            loader.source_url(),
            Err(MapLoadError::MissingApiKey)
        ));

        let loader = MapSdkLoader::new(&config_with_key(Some("  "))).unwrap();
        assert!(matches!(
            loader.source_url(),
            Err(MapLoadError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_load_without_key_fails_and_stays_empty() {
        let loader = MapSdkLoader::new(&config_with_key(None)).unwrap();
        assert!(matches!(
            loader.load().await,
            Err(MapLoadError::MissingApiKey)
        ));
        assert!(!loader.is_loaded());
    }
}
