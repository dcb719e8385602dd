//! # Isochrone CLI
//!
//! Command-line interface for the isochrone library.
//! Reads JSON options from stdin or a file, applies flags and writes a GeoJSON
//! FeatureCollection to stdout.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use isochrone::request::{IntervalEntry, OriginPoint};
use isochrone::{Isochrone, IsochroneRequest};
use log::error;

mod cli;

/// Command-line interface for isochrone
#[derive(Parser)]
#[command(name = "isochrone")]
#[command(about = "Isochrone polygons from OSRM or Valhalla")]
#[command(long_about = "Computes the areas reachable within the given travel times:
  isochrone --lon=8.8071646 --lat=53.0758196 -i 1 -i 3 -i 5 --provider osrm -r 5 -c 0.2 --deintersect
  echo '{\"origin\":{\"type\":\"Point\",\"coordinates\":[8.8,53.07]},\"intervals\":[{\"interval\":10}]}' | isochrone

Options given as JSON (stdin or --input) take precedence over flag defaults;
--lon/--lat and -i replace the JSON origin and intervals.")]
#[command(version)]
struct Cli {
    /// Origin longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Origin latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Distance to draw the probe grid
    #[arg(short, long, default_value_t = 5.0)]
    radius: f64,

    /// The distance across each cell
    #[arg(short, long = "cell-size", default_value_t = 0.1)]
    cell_size: f64,

    /// Intervals for isochrones in minutes
    #[arg(short = 'i', long = "interval")]
    intervals: Vec<f64>,

    /// Routing profile (car, bicycle, foot)
    #[arg(short, long, default_value = "car")]
    profile: String,

    /// Unit of radius and cell size
    #[arg(short, long, default_value = "kilometers")]
    units: String,

    /// Routing provider (valhalla, osrm)
    #[arg(long, default_value = "valhalla")]
    provider: String,

    /// An http-endpoint to the routing provider (e.g.: http://127.0.0.1:5000/table/v1/)
    #[arg(long)]
    endpoint: Option<String>,

    /// Relative measure of concavity
    #[arg(long, default_value_t = 2.0)]
    concavity: f64,

    /// Length threshold
    #[arg(long = "length-threshold", default_value_t = 0.0)]
    length_threshold: f64,

    /// Coordinates per matrix request
    #[arg(long = "batch-size")]
    batch_size: Option<usize>,

    /// Make the isochrones mutually exclusive
    #[arg(long)]
    deintersect: bool,

    /// Read JSON options from a file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print the FeatureCollection
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let mut logger = env_logger::Builder::from_default_env();
    logger.target(env_logger::Target::Stderr);
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(cli).await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let request = match &cli.input {
        Some(path) => read_request_file(path)?,
        None if !std::io::stdin().is_terminal() => {
            let mut json = String::new();
            std::io::stdin()
                .read_to_string(&mut json)
                .context("Failed to read options from stdin")?;
            parse_request(&json)?
        }
        None => IsochroneRequest::default(),
    };

    let request = apply_flags(&cli, request);
    if request.origin.is_none() {
        bail!("Could not determine origin location");
    }
    let (origin, options) = request.resolve()?;

    let mut engine = Isochrone::from_options(&options);
    let progress = if engine.provider().is_matrix() {
        let manager = cli::ProgressManager::new(0, &format!("🌐 Requesting travel times from {}", options.endpoint()));
        engine = engine.with_progress(manager.callback());
        Some(manager)
    } else {
        None
    };

    let collection = engine.compute(origin, &options).await;
    if let Some(manager) = progress {
        if !manager.pb.is_finished() {
            manager.pb.abandon();
        }
    }
    let collection = collection?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };
    println!("{output}");
    Ok(())
}

fn read_request_file(path: &Path) -> anyhow::Result<IsochroneRequest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options from {}", path.display()))?;
    parse_request(&json).with_context(|| format!("Invalid options in {}", path.display()))
}

/// Empty input means no JSON options
fn parse_request(json: &str) -> anyhow::Result<IsochroneRequest> {
    if json.trim().is_empty() {
        return Ok(IsochroneRequest::default());
    }
    serde_json::from_str(json).context("Options are not a valid isochrone request")
}

/// Origin and intervals flags replace the JSON; other flags only fill gaps
fn apply_flags(cli: &Cli, mut request: IsochroneRequest) -> IsochroneRequest {
    if let (Some(lon), Some(lat)) = (cli.lon, cli.lat) {
        request.origin = Some(OriginPoint::new(lon, lat));
    }
    if !cli.intervals.is_empty() {
        request.intervals = cli.intervals.iter().copied().map(IntervalEntry::Minutes).collect();
    }

    request.radius.get_or_insert(cli.radius);
    request.cell_size.get_or_insert(cli.cell_size);
    request.unit.get_or_insert_with(|| cli.units.clone());
    request.concavity.get_or_insert(cli.concavity);
    request.length_threshold.get_or_insert(cli.length_threshold);
    request.deintersect.get_or_insert(cli.deintersect);
    request.profile.get_or_insert_with(|| cli.profile.clone());
    request.provider.get_or_insert_with(|| cli.provider.clone());
    if request.endpoint.is_none() {
        request.endpoint = cli.endpoint.clone();
    }
    if request.batch_size.is_none() {
        request.batch_size = cli.batch_size;
    }
    request
}
