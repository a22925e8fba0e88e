//! Fetch → extract → render.
//!
//! Each stage is a plain function; the HTTP transport, time zone and output
//! sink are supplied by the caller.

use std::fmt::Display;
use std::io::Write;

use chrono::TimeZone;
use tracing::{debug, info};

use crate::client::{QueryParams, Transport, UsgsClient};
use crate::errors::QuakemapError;
use crate::extract::{date_range_title, extract_columns};
use crate::plot::{Format, PlotSpec, write_figure};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of events plotted
    pub event_count: usize,
    /// Map title
    pub title: String,
}

/// Run the full pipeline.
///
/// `open_output` is called only once fetch and extraction have succeeded,
/// so a failed run never creates a partial output.
///
/// # Errors
///
/// Returns the first error from any stage; nothing is retried.
pub fn run<T, Tz, W, F>(
    client: &UsgsClient<T>,
    params: &QueryParams,
    tz: &Tz,
    open_output: F,
    format: Format,
) -> Result<RunSummary, QuakemapError>
where
    T: Transport,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
    F: FnOnce() -> std::io::Result<W>,
{
    let events = client.fetch_events(params)?;

    let title = date_range_title(&events, tz)?;
    let columns = extract_columns(&events, tz)?;
    debug!("extracted {} events for \"{}\"", columns.len(), title);

    let summary = RunSummary {
        event_count: columns.len(),
        title: title.clone(),
    };
    let figure = PlotSpec::new(columns, title).into_figure();

    let mut writer = open_output()?;
    write_figure(&mut writer, &figure, format)?;
    writer.flush()?;

    info!("plotted {} events: {}", summary.event_count, summary.title);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::client::USGS_BASE_URL;
    use crate::client::tests::StubTransport;

    const EXAMPLE_FEED: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"mag": 4.2, "time": 1700000000000, "title": "M 4.2 - 10km N of X"},
            "geometry": {"type": "Point", "coordinates": [-120.5, 37.0, 5.0]}
        }]
    }"#;

    #[test]
    fn test_end_to_end_html() {
        let client = UsgsClient::with_transport(StubTransport::new(200, EXAMPLE_FEED), USGS_BASE_URL);
        let mut buf = Vec::new();

        let summary = run(
            &client,
            &QueryParams::default(),
            &Utc,
            || Ok(&mut buf),
            Format::Html,
        )
        .unwrap();

        assert_eq!(summary.event_count, 1);
        assert_eq!(summary.title, "USGS Earthquakes, Nov 14 to Nov 14");

        let html = String::from_utf8(buf).unwrap();
        assert!(html.contains("\"lon\":[-120.5]"));
        assert!(html.contains("\"lat\":[37.0]"));
        assert!(html.contains("10:13 PM, Tue November 14, 2023\\u003cbr>M 4.2 - 10km N of X"));
    }

    #[test]
    fn test_end_to_end_json_sample_feed() {
        let stub = StubTransport::new(200, include_str!("../tools/sample_query.geojson"));
        let client = UsgsClient::with_transport(stub, USGS_BASE_URL);
        let mut buf = Vec::new();

        let summary = run(
            &client,
            &QueryParams::default(),
            &Utc,
            || Ok(&mut buf),
            Format::Json,
        )
        .unwrap();
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.title, "USGS Earthquakes, Nov 09 to Nov 14");

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["data"][0]["marker"]["size"][2], 15.0);
        assert_eq!(value["data"][0]["lon"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_failure_never_opens_output() {
        let client = UsgsClient::with_transport(
            StubTransport::new(200, r#"{"type":"FeatureCollection","features":[]}"#),
            USGS_BASE_URL,
        );
        let mut opened = false;

        let result = run(
            &client,
            &QueryParams::default(),
            &Utc,
            || {
                opened = true;
                Ok(Vec::new())
            },
            Format::Html,
        );

        assert!(matches!(result, Err(QuakemapError::EmptyDataset)));
        assert!(!opened);
    }

    #[test]
    fn test_remote_error_propagates() {
        let client = UsgsClient::with_transport(StubTransport::new(503, ""), USGS_BASE_URL);

        let result = run(
            &client,
            &QueryParams::default(),
            &Utc,
            || Ok(Vec::new()),
            Format::Html,
        );
        assert!(matches!(
            result,
            Err(QuakemapError::RemoteService { status: 503, .. })
        ));
    }
}
