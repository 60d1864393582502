//! Bus system backend integration
//!
//! Client for the bus system HTTP backend: station search and administration,
//! line administration, and route planning. Also provides a one-shot loader
//! for the third-party map SDK used to draw results.
//!
//! # Architecture
//!
//! [`ApiClient`] owns the HTTP connection pool and the configured
//! [`NormalizationMode`]. Every successful response passes through
//! [`normalize`], which turns the backend's inconsistent envelopes into a
//! single [`Payload`] or an application failure. Failures of either kind are
//! handed to the configured [`ErrorReporter`] exactly once before being
//! returned to the caller. [`BusApi`] defines the per-resource request
//! functions.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_bus::{ApiClient, BusApi, BusApiConfig, Station};
//!
//! let client = ApiClient::new(&BusApiConfig::default())?;
//!
//! let stations: Vec<Station> = client.search_stations("Central").await?.decode()?;
//! let plans = client.plan_route("Central", "Harbour", None).await?;
//! ```

mod client;
mod config;
mod envelope;
mod error;
mod map_loader;
mod models;
mod notify;

pub use client::{ApiClient, ApiRequest, BusApi};
pub use config::{BusApiConfig, MapConfig, NormalizationMode};
pub use envelope::{ApplicationFailure, Envelope, normalize};
pub use error::{ApiError, MapLoadError};
pub use map_loader::{MapSdk, MapSdkLoader};
pub use models::{Line, LineDefinition, OperationResult, Payload, RoutePlan, Segment, Station};
pub use notify::{
    CONNECT_FAILURE_MESSAGE, ErrorReporter, ErrorSignal, FALLBACK_FAILURE_MESSAGE, SignalSource,
    TracingReporter,
};
