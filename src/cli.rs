//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing. Every flag defaults to the
//! plain "plot the last 30 days of M1+ quakes" behavior.

use std::path::PathBuf;

use clap::Parser;

use crate::client::{REQUEST_TIMEOUT_SECS, USGS_BASE_URL};
use crate::plot::Format;

/// Plot recent USGS earthquakes on a world map.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Minimum magnitude to request
    #[arg(
        long,
        default_value = "1",
        allow_negative_numbers = true,
        value_parser = parse_magnitude
    )]
    pub min_magnitude: f64,

    /// File to write the map to
    #[arg(long, short = 'o', default_value = "global_earthquakes.html")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, short = 'f', default_value = "html", value_parser = parse_format)]
    pub format: Format,

    /// Show times in UTC instead of the local time zone
    #[arg(long)]
    pub utc: bool,

    /// Base URL of the USGS API
    #[arg(long, default_value = USGS_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout: u64,

    /// Open the map in the default browser when done
    #[arg(long)]
    pub open: bool,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// `tracing` filter directive for the chosen verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, true) => "debug",
            (false, false) => "info",
        }
    }
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a magnitude, rejecting non-finite values.
fn parse_magnitude(s: &str) -> Result<f64, String> {
    let mag: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid magnitude: {e}"))?;
    if !mag.is_finite() {
        return Err(format!("magnitude must be finite, got {s}"));
    }
    Ok(mag)
}

/// Parse a request timeout; zero would fail every request.
fn parse_timeout(s: &str) -> Result<u64, String> {
    match s.trim().parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".to_string()),
        Ok(secs) => Ok(secs),
        Err(e) => Err(format!("invalid timeout: {e}")),
    }
}
