#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the parcel intelligence engines.
//!
//! Each subcommand reads a JSON request file, runs one engine (or all of
//! them, for `report`), and prints the result as pretty JSON on stdout.
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod requests;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use parcel_intel_config::EngineConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::requests::{BoundaryRequest, NearestRequest, ReportRequest, ResolveRequest};

/// Parcel geometry, attribute reconciliation, and proximity banding.
#[derive(Parser)]
#[command(name = "parcel_intel")]
#[command(about = "Measure parcels, reconcile attributes, and band proximity")]
struct Cli {
    /// TOML file overriding engine tunables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands. Each takes the path of a JSON request.
#[derive(Subcommand)]
enum Commands {
    /// Decompose a parcel outline and classify the lot.
    Boundary {
        /// JSON with `ring` or `geojson`, optional `reference`, `subtype`, `roads`.
        file: PathBuf,
    },

    /// Reconcile competing attribute values.
    Resolve {
        /// JSON with an `attributes` map of name to candidate list.
        file: PathBuf,
    },

    /// Find and band the nearest feature to a point.
    Nearest {
        /// JSON with a `target` point and a `features` list.
        file: PathBuf,
    },

    /// Run every engine over one site.
    Report {
        /// JSON with `parcel`, `attributes`, `features`, and optional `target`.
        file: PathBuf,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Boundary { file } => {
            let request: BoundaryRequest = read_request(&file)?;
            print_json(&requests::run_boundary(&request, &config)?)?;
        }
        Commands::Resolve { file } => {
            let request: ResolveRequest = read_request(&file)?;
            print_json(&requests::run_resolve(&request.attributes, &config))?;
        }
        Commands::Nearest { file } => {
            let request: NearestRequest = read_request(&file)?;
            let result = requests::run_nearest(&request, &config);
            if result.is_none() {
                log::info!(
                    "No feature within {} m of the target",
                    config.proximity.cutoff_m
                );
            }
            print_json(&result)?;
        }
        Commands::Report { file } => {
            let request: ReportRequest = read_request(&file)?;
            print_json(&requests::run_report(&request, &config)?)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    log::debug!("Reading request from {}", path.display());
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
