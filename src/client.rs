//! USGS FDSN event API client.
//!
//! Provides blocking HTTP access to the earthquake query endpoint.
//! Uses reqwest with rustls for TLS. The HTTP layer sits behind
//! [`Transport`] so the fetch logic can run against canned responses.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument, warn};

use crate::errors::QuakemapError;
use crate::models::{EarthquakeEvent, FeatureCollection};

/// Default request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Path of the FDSN event query service.
const QUERY_PATH: &str = "/fdsnws/event/1/query";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Only 200 carries a full query result.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Performs a single GET request.
pub trait Transport {
    /// Send a GET to `url` with the given query pairs.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received at all.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, QuakemapError>;
}

/// [`Transport`] backed by a blocking reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, QuakemapError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, QuakemapError> {
        let response = self.client.get(url).query(query).send()?;
        let status = response.status();

        // Error bodies are informational only
        let body = if status.is_success() {
            response.text()?
        } else {
            response.text().unwrap_or_default()
        };

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Parameters for an event query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryParams {
    /// Smallest magnitude to include
    pub min_magnitude: f64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self { min_magnitude: 1.0 }
    }
}

impl QueryParams {
    /// Query string pairs sent to the API.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format", "geojson".to_string()),
            ("minmagnitude", self.min_magnitude.to_string()),
        ]
    }
}

/// Client for the USGS event query API.
pub struct UsgsClient<T> {
    transport: T,
    base_url: String,
}

impl UsgsClient<HttpTransport> {
    /// Create a client against the public USGS endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuakemapError> {
        Ok(Self::with_transport(HttpTransport::new(timeout)?, base_url))
    }
}

impl<T: Transport> UsgsClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full URL of the query endpoint.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}{QUERY_PATH}", self.base_url)
    }

    /// Fetch events matching `params`, in the order the API returns them.
    ///
    /// # Errors
    ///
    /// Returns `RemoteService` on a non-success status, `MalformedResponse`
    /// if the body is not the expected GeoJSON, and `Http` on transport
    /// failure.
    #[instrument(skip(self), fields(min_magnitude = params.min_magnitude))]
    pub fn fetch_events(&self, params: &QueryParams) -> Result<Vec<EarthquakeEvent>, QuakemapError> {
        let url = self.query_url();
        debug!("fetching events from {}", url);

        let response = self.transport.get(&url, &params.to_query())?;

        // Check status before parsing
        if !response.is_success() {
            return Err(QuakemapError::RemoteService {
                status: response.status,
                message: response.body,
            });
        }

        let feed: FeatureCollection = serde_json::from_str(&response.body)?;
        feed.validate()?;

        if let Some(count) = feed.metadata.as_ref().and_then(|m| m.count) {
            if count != feed.features.len() {
                warn!(
                    "metadata reports {} events but {} were returned",
                    count,
                    feed.features.len()
                );
            }
        }

        let events = feed.into_events()?;
        debug!("fetched {} events", events.len());
        Ok(events)
    }
}
