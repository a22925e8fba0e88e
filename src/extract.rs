//! Column extraction and time formatting.
//!
//! Turns a batch of events into the parallel arrays the map trace needs,
//! plus the date-range title. Time zone is a parameter so output is
//! reproducible under test.

use std::fmt::Display;

use chrono::TimeZone;

use crate::errors::QuakemapError;
use crate::models::EarthquakeEvent;

/// Hover label time format, e.g. "10:13 PM, Tue November 14, 2023".
pub const HOVER_TIME_FORMAT: &str = "%I:%M %p, %a %B %d, %Y";

/// Coarse date used in the map title, e.g. "Nov 14".
pub const MONTH_DAY_FORMAT: &str = "%b %d";

/// Line break understood by the plot's hover labels.
const HOVER_LINE_BREAK: &str = "<br>";

/// Parallel per-event columns, all of equal length and in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventColumns {
    pub magnitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub hover_texts: Vec<String>,
}

impl EventColumns {
    fn with_capacity(n: usize) -> Self {
        Self {
            magnitudes: Vec::with_capacity(n),
            longitudes: Vec::with_capacity(n),
            latitudes: Vec::with_capacity(n),
            hover_texts: Vec::with_capacity(n),
        }
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }
}

/// Format an epoch-millisecond timestamp in `tz` with a strftime pattern.
///
/// # Errors
///
/// Returns `MalformedResponse` if the timestamp is outside chrono's range.
pub fn format_epoch_millis<Tz>(millis: i64, tz: &Tz, pattern: &str) -> Result<String, QuakemapError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = tz.timestamp_millis_opt(millis).single().ok_or_else(|| {
        QuakemapError::MalformedResponse(format!("timestamp {millis} is out of range"))
    })?;
    Ok(time.format(pattern).to_string())
}

/// Build the hover label for one event: local time, a line break, the title.
///
/// # Errors
///
/// Returns `MalformedResponse` if the event time cannot be represented.
pub fn hover_text<Tz>(event: &EarthquakeEvent, tz: &Tz) -> Result<String, QuakemapError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = format_epoch_millis(event.time, tz, HOVER_TIME_FORMAT)?;
    Ok(format!("{time}{HOVER_LINE_BREAK}{}", event.title))
}

/// Split events into plot columns in a single pass.
///
/// # Errors
///
/// Returns `EmptyDataset` for an empty batch and `MalformedResponse` for an
/// unrepresentable timestamp.
pub fn extract_columns<Tz>(events: &[EarthquakeEvent], tz: &Tz) -> Result<EventColumns, QuakemapError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if events.is_empty() {
        return Err(QuakemapError::EmptyDataset);
    }

    let mut columns = EventColumns::with_capacity(events.len());
    for event in events {
        columns.magnitudes.push(event.magnitude);
        columns.longitudes.push(event.longitude);
        columns.latitudes.push(event.latitude);
        columns.hover_texts.push(hover_text(event, tz)?);
    }
    Ok(columns)
}

/// Build "USGS Earthquakes, {start} to {end}" from the earliest and latest
/// event times.
///
/// The API order is not relied upon; the bounds are the min and max
/// timestamps in the batch.
///
/// # Errors
///
/// Returns `EmptyDataset` for an empty batch.
pub fn date_range_title<Tz>(events: &[EarthquakeEvent], tz: &Tz) -> Result<String, QuakemapError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let first = events.iter().map(|e| e.time).min();
    let last = events.iter().map(|e| e.time).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(QuakemapError::EmptyDataset);
    };

    let start = format_epoch_millis(first, tz, MONTH_DAY_FORMAT)?;
    let end = format_epoch_millis(last, tz, MONTH_DAY_FORMAT)?;
    Ok(format!("USGS Earthquakes, {start} to {end}"))
}
