//! Road snapping and stop naming through OSRM's Nearest API.
//!
//! [`OsrmNearestClient`] implements the synchronous [`RoadSnapper`] and
//! [`PlaceNamer`] traits by blocking on asynchronous HTTP requests, keeping
//! the optimisation engine free of any async runtime. Requests are spaced by
//! a minimum interval and retried with linear backoff on timeouts, rate
//! limiting and server errors.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use schoolrun_core::RoadSnapper;
//! use schoolrun_data::routing::{OsrmClientConfig, OsrmNearestClient};
//!
//! let client = OsrmNearestClient::with_config(
//!     OsrmClientConfig::new("http://localhost:5000").with_profile("driving"),
//! )?;
//! let snapped = client.snap_to_roads(&[Coord { x: 14.42, y: 50.08 }])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use geo::Coord;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use schoolrun_core::{PlaceNamer, RefineError, RoadSnapper};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{
    osrm::{NearestResponse, Waypoint},
    throttle::Throttle,
};

/// Error type for [`OsrmNearestClient`] construction failures.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "schoolrun-routing/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`OsrmNearestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsrmClientConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Routing profile used in request paths.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Minimum spacing between consecutive requests.
    pub min_request_interval: Duration,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,
    /// Delay before the first retry; later retries wait proportionally longer.
    pub retry_backoff: Duration,
}

impl Default for OsrmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            profile: "driving".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            min_request_interval: Duration::from_millis(50),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl OsrmClientConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the minimum spacing between requests.
    #[must_use]
    pub const fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// Set the retry budget and backoff.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }
}

/// OSRM Nearest client used to snap stops to streets and name them.
///
/// The client owns a Tokio runtime that is reused across calls. When called
/// from within an existing multi-threaded Tokio runtime it borrows that
/// runtime's handle through [`tokio::task::block_in_place`]; from a
/// `current_thread` runtime it falls back to its own runtime, which may stall
/// the caller's runtime for the duration of the batch.
///
/// Points are requested one at a time because the Nearest service accepts a
/// single coordinate. A point OSRM cannot snap yields `None`; transport and
/// service failures abort the batch so the engine can fall back for every
/// stop at once.
pub struct OsrmNearestClient {
    client: Client,
    config: OsrmClientConfig,
    runtime: Runtime,
    throttle: Throttle,
}

impl std::fmt::Debug for OsrmNearestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmNearestClient")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl OsrmNearestClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(OsrmClientConfig::new(base_url))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OsrmClientConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        let throttle = Throttle::new(config.min_request_interval);
        Ok(Self {
            client,
            config,
            runtime,
            throttle,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &OsrmClientConfig {
        &self.config
    }

    /// Build the Nearest API URL for `point`.
    ///
    /// The URL format is `{base_url}/nearest/v1/{profile}/{lng},{lat}?number=1`.
    fn nearest_url(&self, point: Coord<f64>) -> String {
        format!(
            "{}/nearest/v1/{}/{},{}?number=1",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            point.x,
            point.y
        )
    }

    /// Fetch the nearest waypoint for every point, in order.
    fn nearest_batch(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Waypoint>>, RefineError> {
        if points.is_empty() {
            return Err(RefineError::EmptyInput);
        }
        let future = async {
            let mut waypoints = Vec::with_capacity(points.len());
            for point in points {
                waypoints.push(self.nearest_with_retry(*point).await?);
            }
            Ok(waypoints)
        };
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    async fn nearest_with_retry(&self, point: Coord<f64>) -> Result<Option<Waypoint>, RefineError> {
        let url = self.nearest_url(point);
        let mut attempt = 0;
        loop {
            self.throttle.wait().await;
            match self.fetch_nearest(&url).await {
                Err(err) if is_retryable(&err) && attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!("retrying {url} after attempt {attempt} failed: {err}");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(err) => {
                    warn!("nearest lookup failed for {url}: {err}");
                    return Err(err);
                }
                Ok(waypoint) => return Ok(waypoint),
            }
        }
    }

    async fn fetch_nearest(&self, url: &str) -> Result<Option<Waypoint>, RefineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RefineError::RateLimited {
                url: url.to_owned(),
            });
        }
        // OSRM reports NoSegment and InvalidQuery with a 400 status and a JSON
        // body, so only non-client errors are surfaced from the status line.
        if response.status().is_server_error() {
            return Err(RefineError::HttpError {
                url: url.to_owned(),
                status: response.status().as_u16(),
                message: response.status().to_string(),
            });
        }
        let body: NearestResponse =
            response
                .json()
                .await
                .map_err(|err| RefineError::ParseError {
                    message: err.to_string(),
                })?;
        convert_response(body)
    }

    /// Convert a reqwest error to a `RefineError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RefineError {
        if error.is_timeout() {
            return RefineError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RefineError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RefineError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Convert an OSRM response into the nearest waypoint, if any.
fn convert_response(response: NearestResponse) -> Result<Option<Waypoint>, RefineError> {
    if response.is_no_segment() {
        return Ok(None);
    }
    if !response.is_ok() {
        return Err(RefineError::ServiceError {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }
    Ok(response.waypoints.into_iter().next())
}

const fn is_retryable(error: &RefineError) -> bool {
    match error {
        RefineError::Timeout { .. } | RefineError::RateLimited { .. } => true,
        RefineError::HttpError { status, .. } => *status >= 500,
        _ => false,
    }
}

impl RoadSnapper for OsrmNearestClient {
    fn snap_to_roads(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Coord<f64>>>, RefineError> {
        let waypoints = self.nearest_batch(points)?;
        Ok(waypoints
            .iter()
            .map(|waypoint| waypoint.as_ref().map(Waypoint::coord))
            .collect())
    }
}

impl PlaceNamer for OsrmNearestClient {
    fn name_places(&self, points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError> {
        let waypoints = self.nearest_batch(points)?;
        Ok(waypoints
            .iter()
            .map(|waypoint| {
                waypoint
                    .as_ref()
                    .and_then(Waypoint::street_name)
                    .map(str::to_owned)
            })
            .collect())
    }
}
