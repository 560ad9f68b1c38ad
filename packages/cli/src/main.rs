#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for the North Station assault hotspot analysis.
//!
//! ```text
//! crime_hotspot analyze --input incidents.csv [--config run.toml] [--seed 42] [--output-dir out]
//! crime_hotspot radii --input incidents.csv [--config run.toml] [--seed 42]
//! crime_hotspot synthesize --output synthetic.csv [--count 500] [--seed 42]
//! crime_hotspot config [--config run.toml]
//! ```
//!
//! Uses `indicatif-log-bridge` (via [`crime_hotspot_cli_utils::init_logger`])
//! so log lines and the stage bar never fight for the terminal. Set
//! `RUST_LOG=info` for stage detail.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crime_hotspot_analytics::export::write_all;
use crime_hotspot_analytics::{AnalysisConfig, analyze_records};
use crime_hotspot_cli_utils::IndicatifProgress;
use crime_hotspot_source::csv_file::{read_records, write_records};
use crime_hotspot_source::normalize;
use crime_hotspot_source::synthetic::scatter_incidents;
use crime_hotspot_spatial::radius_sensitivity;

const DEFAULT_SEED: u64 = 42;

#[derive(Parser)]
#[command(
    name = "crime_hotspot",
    about = "Assault density, hotspot and model comparison for the North Station streets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write the table, report, map layer and summary
    Analyze {
        /// Incident CSV export
        #[arg(long)]
        input: PathBuf,
        /// TOML file overriding the default settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for the split, folds and coordinate jitter
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Directory for output files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Print the density distribution at every candidate radius
    Radii {
        /// Incident CSV export
        #[arg(long)]
        input: PathBuf,
        /// TOML file overriding the default settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for the coordinate jitter
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Write synthetic incidents scattered over the configured bounds
    Synthesize {
        /// Destination CSV
        #[arg(long)]
        output: PathBuf,
        /// Number of incidents (defaults to the configured count)
        #[arg(long)]
        count: Option<usize>,
        /// TOML file overriding the default settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for placement and dates
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML file overriding the default settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_hotspot_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            seed,
            output_dir,
        } => {
            let config = AnalysisConfig::load(config.as_deref())?;
            let records = read_records(&input)?;

            let progress = IndicatifProgress::steps_bar(&multi, "Analyzing");
            let analysis = analyze_records(&records, &config, seed, &progress)?;
            let written = write_all(&output_dir, &analysis)?;

            println!("\n{:<4} {:<20} {:>12} {:>10}", "RANK", "MODEL", "MSE", "RMSE");
            println!("{}", "-".repeat(50));
            for (rank, result) in analysis.report.ranking.iter().enumerate() {
                println!(
                    "{:<4} {:<20} {:>12.4} {:>10.4}",
                    rank + 1,
                    result.model.label(),
                    result.mse,
                    result.rmse
                );
            }
            println!(
                "\nBest model: {}. {} of {} incidents are hotspots (density >= {:.2}).",
                analysis.report.best_model.label(),
                analysis.report.hotspots.hotspots,
                analysis.report.hotspots.total,
                analysis.report.hotspots.threshold
            );
            for path in &written {
                println!("  {}", path.display());
            }
        }
        Commands::Radii {
            input,
            config,
            seed,
        } => run_radii(&input, config.as_deref(), seed)?,
        Commands::Synthesize {
            output,
            count,
            config,
            seed,
        } => {
            let config = AnalysisConfig::load(config.as_deref())?;
            let count = count.unwrap_or(config.synthetic.count);
            let records = scatter_incidents(count, &config.synthetic.bounds, seed)?;
            write_records(&output, &records)?;
            println!("Wrote {count} synthetic incidents to {}", output.display());
        }
        Commands::Config { config } => {
            print!("{}", AnalysisConfig::load(config.as_deref())?.to_toml()?);
        }
    }

    Ok(())
}

fn run_radii(input: &Path, config: Option<&Path>, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = AnalysisConfig::load(config)?;
    let records = read_records(input)?;
    let normalized = normalize(&records, &config.filter, &config.correction, seed)?;
    let positions: Vec<[f64; 2]> = normalized
        .incidents
        .iter()
        .map(|i| [i.longitude, i.latitude])
        .collect();

    let summaries = radius_sensitivity(
        &positions,
        &config.density.candidate_radii,
        config.density.meters_per_degree,
    )?;

    println!(
        "{:<10} {:>8} {:>10} {:>6} {:>6}",
        "RADIUS", "~METERS", "MEAN", "MIN", "MAX"
    );
    println!("{}", "-".repeat(44));
    for summary in &summaries {
        let marker = if (summary.radius - config.density.radius).abs() < f64::EPSILON {
            " *"
        } else {
            ""
        };
        println!(
            "{:<10.4} {:>8.0} {:>10.2} {:>6} {:>6}{marker}",
            summary.radius, summary.approx_meters, summary.mean, summary.min, summary.max
        );
    }
    println!(
        "\n{} incidents; * marks the operating radius",
        positions.len()
    );
    Ok(())
}
