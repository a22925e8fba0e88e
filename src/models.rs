//! Data models for USGS FDSN event query responses.
//!
//! These structures match the GeoJSON format returned by
//! `/fdsnws/event/1/query?format=geojson`. Only the fields the map needs
//! are required; everything else in the payload is ignored.

use serde::Deserialize;

use crate::errors::QuakemapError;

/// Top-level GeoJSON response.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type", default)]
    pub type_: Option<String>,

    /// Query metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Earthquake events
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), QuakemapError> {
        match self.type_.as_deref() {
            None | Some("FeatureCollection") => Ok(()),
            Some(other) => Err(QuakemapError::MalformedResponse(format!(
                "expected type 'FeatureCollection', got '{other}'"
            ))),
        }
    }

    /// Convert every feature into an [`EarthquakeEvent`], keeping API order.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` naming the first feature that fails
    /// validation.
    pub fn into_events(self) -> Result<Vec<EarthquakeEvent>, QuakemapError> {
        self.features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| {
                EarthquakeEvent::try_from(feature).map_err(|e| match e {
                    QuakemapError::MalformedResponse(msg) => {
                        QuakemapError::MalformedResponse(format!("feature {idx}: {msg}"))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

/// Metadata about the query response.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// Number of events in response
    pub count: Option<usize>,
}

/// A single earthquake event as delivered by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Geographic location
    pub geometry: Geometry,

    /// Event properties
    pub properties: Properties,
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// Event properties used for plotting.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: f64,

    /// Event time (ms since epoch)
    pub time: i64,

    /// Human-readable title, e.g. "M 4.2 - 10km N of X"
    pub title: String,
}

/// One validated earthquake, ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeEvent {
    pub magnitude: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Occurrence time (ms since epoch)
    pub time: i64,
    pub title: String,
}

impl TryFrom<Feature> for EarthquakeEvent {
    type Error = QuakemapError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        let coords = &feature.geometry.coordinates;
        let (Some(&longitude), Some(&latitude)) = (coords.first(), coords.get(1)) else {
            return Err(QuakemapError::MalformedResponse(format!(
                "expected at least 2 coordinates, got {}",
                coords.len()
            )));
        };

        Ok(Self {
            magnitude: feature.properties.mag,
            longitude,
            latitude,
            time: feature.properties.time,
            title: feature.properties.title,
        })
    }
}
