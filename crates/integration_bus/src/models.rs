//! Bus system data models
//!
//! Typed representations of stations, lines and planned routes as returned
//! by the backend. The backend serializes with snake_case keys; camelCase
//! aliases are accepted as well.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::envelope::{Envelope, is_falsy};
use crate::error::ApiError;

/// A normalized response payload
///
/// Holds whatever the normalizer produced: the unwrapped data in unwrap mode,
/// or the untouched body in pass-through mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// Wrap a JSON value
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON value
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the underlying JSON value
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Whether the payload is empty in the loose sense used by UI code:
    /// `null`, `false`, `0` or an empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_falsy(&self.0)
    }

    /// Classify the payload as an envelope, for callers in pass-through mode
    #[must_use]
    pub fn envelope(&self) -> Envelope {
        Envelope::decode(self.0.clone())
    }

    /// Deserialize the payload into a model
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ParseError`] if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.0).map_err(|e| ApiError::ParseError(e.to_string()))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bus station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    /// Station identifier
    #[serde(alias = "stationId")]
    pub station_id: u32,
    /// Display name
    #[serde(alias = "stationName")]
    pub station_name: String,
    /// Longitude (filled in by the backend's geocoder, may be missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Latitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

impl Station {
    /// Create a station without coordinates
    #[must_use]
    pub fn new(station_id: u32, station_name: impl Into<String>) -> Self {
        Self {
            station_id,
            station_name: station_name.into(),
            longitude: None,
            latitude: None,
        }
    }

    /// Coordinates as `(latitude, longitude)` when both are known
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coordinates() {
            Some((lat, lon)) => write!(
                f,
                "[{}] {} ({lat:.5}, {lon:.5})",
                self.station_id, self.station_name
            ),
            None => write!(f, "[{}] {}", self.station_id, self.station_name),
        }
    }
}

/// A bus line as listed by `/api/routes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    /// Line identifier
    #[serde(alias = "lineOrder")]
    pub line_order: u32,
    /// Display name, e.g. "12路"
    #[serde(alias = "lineName")]
    pub line_name: String,
    /// Direction label
    #[serde(default)]
    pub direction: Option<String>,
    /// First departure, `HH:MM:SS`
    #[serde(default, alias = "startTime")]
    pub start_time: Option<String>,
    /// Last departure, `HH:MM:SS`
    #[serde(default, alias = "finishTime")]
    pub finish_time: Option<String>,
    /// Headway in minutes
    #[serde(default, alias = "intervalTime")]
    pub interval_time: Option<u32>,
    /// Stations served, in order
    #[serde(default, alias = "stationIds", deserialize_with = "null_as_empty")]
    pub station_ids: Vec<u32>,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.line_order, self.line_name)?;
        if let Some(direction) = &self.direction {
            write!(f, " ({direction})")?;
        }
        if let (Some(st), Some(ft)) = (&self.start_time, &self.finish_time) {
            write!(f, " {st}–{ft}")?;
        }
        if let Some(interval) = self.interval_time {
            write!(f, " every {interval}min")?;
        }
        write!(f, ", {} stops", self.station_ids.len())
    }
}

/// Body for creating or updating a line through the admin API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineDefinition {
    /// Line identifier
    pub line_order: u32,
    /// Display name
    pub line_name: String,
    /// Direction label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// First departure, `HH:MM`
    #[serde(rename = "st", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Last departure, `HH:MM`
    #[serde(rename = "ft", skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<String>,
    /// Headway in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Stations served, in order
    #[serde(default)]
    pub station_ids: Vec<u32>,
}

impl LineDefinition {
    /// Create a definition with only the required fields
    #[must_use]
    pub fn new(line_order: u32, line_name: impl Into<String>) -> Self {
        Self {
            line_order,
            line_name: line_name.into(),
            direction: None,
            start_time: None,
            finish_time: None,
            interval: None,
            station_ids: Vec::new(),
        }
    }
}

/// One planned route returned by `/api/routes/plan`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePlan {
    /// Route identifier
    #[serde(alias = "routeId")]
    pub route_id: String,
    /// Estimated duration in minutes
    #[serde(default)]
    pub duration: Option<u32>,
    /// Rides making up the route
    #[serde(default, deserialize_with = "null_as_empty")]
    pub segments: Vec<Segment>,
    /// Number of transfers
    #[serde(default)]
    pub transfers: Option<u32>,
    /// Total stops travelled
    #[serde(default, alias = "totalStops")]
    pub total_stops: Option<u32>,
}

impl RoutePlan {
    /// Format as a compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        let route = self
            .segments
            .iter()
            .map(|s| s.line_name.as_str())
            .collect::<Vec<_>>()
            .join(" → ");
        let duration = self
            .duration
            .map_or_else(|| "?".to_string(), |d| d.to_string());
        let transfers = self
            .transfers
            .unwrap_or_else(|| u32::try_from(self.segments.len().saturating_sub(1)).unwrap_or(0));
        let stops = self
            .total_stops
            .unwrap_or_else(|| self.segments.iter().filter_map(|s| s.stops_count).sum());

        format!("{duration}min, {transfers} transfer(s), {stops} stops: {route}")
    }
}

impl fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}

/// A single ride on one line within a [`RoutePlan`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// Line ridden
    #[serde(alias = "lineOrder")]
    pub line_order: u32,
    /// Line display name
    #[serde(alias = "lineName")]
    pub line_name: String,
    /// Boarding station id
    #[serde(alias = "fromSid")]
    pub from_sid: u32,
    /// Alighting station id
    #[serde(alias = "toSid")]
    pub to_sid: u32,
    /// Station ids passed, boarding and alighting included
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stations: Vec<u32>,
    /// Full station records for `stations`
    #[serde(default, alias = "stationDetails", deserialize_with = "null_as_empty")]
    pub station_details: Vec<Station>,
    /// Number of stops ridden
    #[serde(default, alias = "stopsCount")]
    pub stops_count: Option<u32>,
    /// Duration of this ride in minutes
    #[serde(default, alias = "segmentDuration")]
    pub segment_duration: Option<u32>,
}

/// The backend sends `null` for lists it never filled in
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reply of the admin endpoints: `{ success, message }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationResult {
    /// Whether the operation was applied
    pub success: bool,
    /// Human-readable outcome
    #[serde(default)]
    pub message: String,
}
