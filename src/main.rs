//! quakemap - plot recent earthquakes on a world map.
//!
//! Fetches M1+ events from the USGS FDSN event service and writes an
//! interactive plotly `scattergeo` map to an HTML file.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use tracing::{error, info, warn};

mod cli;
mod client;
mod errors;
mod extract;
mod models;
mod pipeline;
mod plot;

use cli::Cli;
use client::{QueryParams, UsgsClient};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_filter());

    let client = UsgsClient::new(&cli.base_url, Duration::from_secs(cli.timeout))
        .context("failed to create USGS client")?;
    let params = QueryParams {
        min_magnitude: cli.min_magnitude,
    };
    let open_output = || File::create(&cli.output).map(BufWriter::new);

    let summary = if cli.utc {
        pipeline::run(&client, &params, &Utc, open_output, cli.format)
    } else {
        pipeline::run(&client, &params, &Local, open_output, cli.format)
    }
    .with_context(|| format!("failed to plot earthquakes to {}", cli.output.display()))?;

    info!(
        "wrote {} events to {}",
        summary.event_count,
        cli.output.display()
    );

    if cli.open {
        open_in_browser(&cli.output);
    }

    Ok(())
}

/// Log to stderr so a JSON figure piped elsewhere stays clean.
fn init_tracing(directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Open the written map with the platform's default handler.
fn open_in_browser(path: &Path) {
    #[cfg(target_os = "linux")]
    let spawned = std::process::Command::new("xdg-open").arg(path).spawn();
    #[cfg(target_os = "macos")]
    let spawned = std::process::Command::new("open").arg(path).spawn();
    #[cfg(target_os = "windows")]
    let spawned = std::process::Command::new("cmd")
        .args(["/c", "start", ""])
        .arg(path)
        .spawn();
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    let spawned: io::Result<std::process::Child> = Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "no browser launcher for this platform",
    ));

    if let Err(e) = spawned {
        warn!("could not open {}: {}", path.display(), e);
    }
}
