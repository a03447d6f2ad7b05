//! outagewatch - live outage tracker for the Nashville Electric Service map.
//!
//! Fetches the current outage snapshot, enriches the most-affected outages
//! with reverse-geocoded street addresses, and prints the filtered list.
//! With `--watch` it keeps polling in the background until interrupted.

mod api;
mod app;
mod cache;
mod config;
mod enrich;
mod filters;
mod geocode;
mod models;
mod poller;
mod stats;
mod utils;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::OutageApp;
use config::Config;
use filters::{FilterOptions, SortBy};
use models::Outage;
use utils::{format_duration, format_people_affected, format_people_count, format_timestamp};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

struct CliArgs {
    refresh: bool,
    watch: bool,
    options: FilterOptions,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut cli = CliArgs {
        refresh: false,
        watch: false,
        options: FilterOptions::default(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--refresh" => cli.refresh = true,
            "--watch" => cli.watch = true,
            "--status" => {
                cli.options.status = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--status requires a value"))?;
            }
            "--search" => {
                cli.options.query = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--search requires a value"))?;
            }
            "--sort" => {
                let key = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sort requires a value"))?;
                cli.options.sort_by = SortBy::parse(&key).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown sort order '{}' (expected most-affected, recent, oldest, last-updated)",
                        key
                    )
                })?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(cli)
}

fn print_usage() {
    println!("Usage: outagewatch [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --refresh         Bypass the snapshot cache and fetch fresh data");
    println!("  --watch           Keep polling every 3 minutes until interrupted");
    println!("  --status <TOKEN>  Only show outages whose status matches (e.g. assigned)");
    println!("  --search <TEXT>   Filter by id, identifier, or address text");
    println!("  --sort <ORDER>    most-affected (default), recent, oldest, last-updated");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = parse_args()?;
    let config = Config::load()?;
    let app = OutageApp::new(&config)?;

    info!("outagewatch starting");
    if cli.refresh {
        app.refetch().await;
    } else {
        app.load(false).await;
    }

    if app.first_load_failed() {
        anyhow::bail!(
            "Could not load outage data: {}",
            app.error().unwrap_or_else(|| "unknown error".to_string())
        );
    }

    print_report(&app, &cli.options);

    if cli.watch {
        let _poller = app.start();
        println!("\nPolling every {}s; press Ctrl-C to stop.", config.poll_interval_secs);
        tokio::signal::ctrl_c().await?;
        info!("outagewatch shutting down");
    }

    Ok(())
}

fn print_report(app: &OutageApp, options: &FilterOptions) {
    let stats = app.stats();
    println!(
        "{} active outages, {} affected (largest: {}, average: {})",
        stats.total_outages,
        format_people_count(stats.total_affected),
        stats.largest_outage,
        stats.average_affected,
    );
    if let Some(updated) = app.last_updated() {
        println!("Last updated: {}", updated.format("%b %d, %H:%M:%S UTC"));
    }
    if let Some(error) = app.error() {
        println!("Last refresh failed: {}", error);
    }

    let progress = app.enrichment_progress();
    if progress.total > 0 {
        let suffix = if app.is_enriching() { " (resolving...)" } else { "" };
        println!(
            "Addresses resolved for {} of {} most-affected outages{}",
            progress.current, progress.total, suffix
        );
    }
    println!();

    let view = app.view(options);
    if view.is_empty() {
        println!("No outages match the current filters.");
        return;
    }

    for outage in &view {
        print_outage(app, outage);
    }
}

fn print_outage(app: &OutageApp, outage: &Outage) {
    let location = app
        .address(&outage.id)
        .map(|a| a.formatted)
        .unwrap_or_else(|| "(address pending)".to_string());

    println!(
        "[{}] {} - {}",
        outage.status.as_deref().unwrap_or("Unknown"),
        outage.identifier.as_deref().unwrap_or(&outage.id),
        location,
    );
    println!(
        "    {} | started {} | updated {}",
        format_people_affected(outage.num_people),
        format_duration(outage.start_time),
        format_timestamp(outage.last_updated_time),
    );
    if let Some(cause) = &outage.cause {
        println!("    Cause: {}", cause);
    }
}
