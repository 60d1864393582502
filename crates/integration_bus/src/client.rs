//! HTTP client for the bus system backend
//!
//! [`ApiClient`] issues one request per call, normalizes every 2xx body and
//! reports each failure to its [`ErrorReporter`] exactly once. [`BusApi`]
//! exposes the resource functions on top of it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::BusApiConfig;
use crate::envelope::normalize;
use crate::error::ApiError;
use crate::models::{LineDefinition, Payload};
use crate::notify::{ErrorReporter, TracingReporter};

/// Resource functions of the bus system backend
///
/// Each function issues exactly one HTTP call and resolves through the
/// client's normalizer.
#[async_trait]
pub trait BusApi: Send + Sync {
    /// List every station (`GET /api/stations`)
    async fn list_stations(&self) -> Result<Payload, ApiError>;

    /// Search stations by id or name fragment (`GET /api/stations/search`)
    async fn search_stations(&self, query: &str) -> Result<Payload, ApiError>;

    /// Admin station lookup; `None` lists all (`GET /api/admin/station`)
    async fn admin_search_stations(&self, keyword: Option<&str>) -> Result<Payload, ApiError>;

    /// Create a station (`POST /api/admin/station?id=&name=`)
    async fn add_station(&self, id: u32, name: &str) -> Result<Payload, ApiError>;

    /// Rename a station (`PUT /api/admin/station?id=&name=`)
    async fn update_station(&self, id: u32, name: &str) -> Result<Payload, ApiError>;

    /// Delete a station (`DELETE /api/admin/station/{id}`)
    async fn delete_station(&self, id: u32) -> Result<Payload, ApiError>;

    /// List every line (`GET /api/routes`)
    async fn list_routes(&self) -> Result<Payload, ApiError>;

    /// Create a line (`POST /api/admin/line`)
    async fn add_line(&self, line: &LineDefinition) -> Result<Payload, ApiError>;

    /// Replace a line (`PUT /api/admin/line`)
    async fn update_line(&self, line: &LineDefinition) -> Result<Payload, ApiError>;

    /// Delete a line (`DELETE /api/admin/line/{id}`)
    async fn delete_line(&self, id: u32) -> Result<Payload, ApiError>;

    /// Plan routes between two stations given by name or id
    /// (`GET /api/routes/plan`)
    async fn plan_route(
        &self,
        start: &str,
        end: &str,
        max_transfers: Option<u8>,
    ) -> Result<Payload, ApiError>;

    /// Lines serving a station given by id or name
    /// (`GET /api/station/{identifier}/lines`)
    async fn station_lines(&self, identifier: &str) -> Result<Payload, ApiError>;

    /// Stations of a line given by id or name
    /// (`GET /api/line/{identifier}/stations`)
    async fn line_stations(&self, identifier: &str) -> Result<Payload, ApiError>;
}

/// A single backend call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Create a request for a static path such as `/api/stations`
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET` request
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request
    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request
    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` request
    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a path segment; it is percent-encoded as a whole
    #[must_use]
    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Unencoded path, for logging
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Client for the bus system backend
///
/// Immutable after construction; share it by reference or wrap it in an
/// `Arc`. Concurrent calls are independent of each other.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    config: BusApiConfig,
    reporter: Arc<dyn ErrorReporter>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("mode", &self.config.mode)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that logs failures through `tracing`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &BusApiConfig) -> Result<Self, ApiError> {
        Self::with_reporter(config, Arc::new(TracingReporter))
    }

    /// Create a client that hands failures to `reporter`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn with_reporter(
        config: &BusApiConfig,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self, ApiError> {
        config.validate().map_err(ApiError::ConfigurationError)?;

        let base =
            Url::parse(&config.base_url).map_err(|e| ApiError::ConfigurationError(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            client,
            base,
            config: config.clone(),
            reporter,
        })
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &BusApiConfig {
        &self.config
    }

    /// Issue a request and normalize its response
    ///
    /// Every failure is reported once to the configured reporter before it
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns a transport error for network failures, timeouts and non-2xx
    /// statuses, or [`ApiError::Application`] when the body reports a failure.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    pub async fn execute(&self, request: ApiRequest) -> Result<Payload, ApiError> {
        let outcome = self.dispatch(request).await;

        match &outcome {
            Ok(payload) => debug!(empty = payload.is_empty(), "Request succeeded"),
            Err(err) => {
                debug!(error = %err, "Request failed");
                self.reporter.report(&err.signal());
            },
        }

        outcome
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<Payload, ApiError> {
        let url = self.url_for(&request)?;

        let mut builder = self.client.request(request.method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let value = normalize(parse_body(&text), self.config.mode)?;
        Ok(Payload::from(value))
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::ConfigurationError("base_url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }

    fn transport_error(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
        } else {
            ApiError::ConnectionFailed(err.to_string())
        }
    }
}

/// Decode a response body: empty is `null`, non-JSON text stays a string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl BusApi for ApiClient {
    async fn list_stations(&self) -> Result<Payload, ApiError> {
        self.execute(ApiRequest::get("/api/stations")).await
    }

    async fn search_stations(&self, query: &str) -> Result<Payload, ApiError> {
        self.execute(ApiRequest::get("/api/stations/search").query("query", query))
            .await
    }

    async fn admin_search_stations(&self, keyword: Option<&str>) -> Result<Payload, ApiError> {
        let request = ApiRequest::get("/api/admin/station");
        let request = match keyword {
            Some(keyword) => request.query("keyword", keyword),
            None => request,
        };
        self.execute(request).await
    }

    async fn add_station(&self, id: u32, name: &str) -> Result<Payload, ApiError> {
        self.execute(
            ApiRequest::post("/api/admin/station")
                .query("id", id)
                .query("name", name),
        )
        .await
    }

    async fn update_station(&self, id: u32, name: &str) -> Result<Payload, ApiError> {
        self.execute(
            ApiRequest::put("/api/admin/station")
                .query("id", id)
                .query("name", name),
        )
        .await
    }

    async fn delete_station(&self, id: u32) -> Result<Payload, ApiError> {
        self.execute(ApiRequest::delete("/api/admin/station").segment(id))
            .await
    }

    async fn list_routes(&self) -> Result<Payload, ApiError> {
        self.execute(ApiRequest::get("/api/routes")).await
    }

    async fn add_line(&self, line: &LineDefinition) -> Result<Payload, ApiError> {
        let body = serde_json::to_value(line).map_err(|e| ApiError::ParseError(e.to_string()))?;
        self.execute(ApiRequest::post("/api/admin/line").json(body))
            .await
    }

    async fn update_line(&self, line: &LineDefinition) -> Result<Payload, ApiError> {
        let body = serde_json::to_value(line).map_err(|e| ApiError::ParseError(e.to_string()))?;
        self.execute(ApiRequest::put("/api/admin/line").json(body))
            .await
    }

    async fn delete_line(&self, id: u32) -> Result<Payload, ApiError> {
        self.execute(ApiRequest::delete("/api/admin/line").segment(id))
            .await
    }

    async fn plan_route(
        &self,
        start: &str,
        end: &str,
        max_transfers: Option<u8>,
    ) -> Result<Payload, ApiError> {
        let request = ApiRequest::get("/api/routes/plan")
            .query("start", start)
            .query("end", end);
        let request = match max_transfers {
            Some(max) => request.query("maxTransfers", max),
            None => request,
        };
        self.execute(request).await
    }

    async fn station_lines(&self, identifier: &str) -> Result<Payload, ApiError> {
        self.execute(
            ApiRequest::get("/api/station")
                .segment(identifier)
                .segment("lines"),
        )
        .await
    }

    async fn line_stations(&self, identifier: &str) -> Result<Payload, ApiError> {
        self.execute(
            ApiRequest::get("/api/line")
                .segment(identifier)
                .segment("stations"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::notify::{CONNECT_FAILURE_MESSAGE, MockErrorReporter};

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body(r#"{"code":200}"#), json!({ "code": 200 }));
        assert_eq!(parse_body("成功删除"), json!("成功删除"));
    }

    #[test]
    fn test_request_path_segments() {
        let request = ApiRequest::delete("/api/admin/station/").segment(42);
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(request.path(), "/api/admin/station/42");
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = ApiClient::new(&BusApiConfig::for_testing("http://localhost:8080")).unwrap();
        let request = ApiRequest::get("/api/station")
            .segment("人民/广场")
            .segment("lines");

        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/station/%E4%BA%BA%E6%B0%91%2F%E5%B9%BF%E5%9C%BA/lines"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client =
            ApiClient::new(&BusApiConfig::for_testing("http://localhost:8080/bus/")).unwrap();
        let url = client.url_for(&ApiRequest::get("/api/routes")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/bus/api/routes");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = BusApiConfig {
            timeout_ms: 0,
            ..BusApiConfig::default()
        };
        assert!(matches!(
            ApiClient::new(&config),
            Err(ApiError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn test_reporter_called_once_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/routes"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|signal| signal.message == CONNECT_FAILURE_MESSAGE)
            .times(1)
            .return_const(());

        let client =
            ApiClient::with_reporter(&BusApiConfig::for_testing(server.uri()), Arc::new(reporter))
                .unwrap();

        let err = client.list_routes().await.unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_reporter_not_called_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut reporter = MockErrorReporter::new();
        reporter.expect_report().times(0);

        let client =
            ApiClient::with_reporter(&BusApiConfig::for_testing(server.uri()), Arc::new(reporter))
                .unwrap();

        let payload = client.list_stations().await.unwrap();
        assert_eq!(payload.into_inner(), json!([]));
    }
}
