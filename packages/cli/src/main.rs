#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the price map crawler.
//!
//! Settings are resolved as built-in defaults, then an optional TOML file
//! (`--config`), then individual flags. Running without a subcommand
//! starts the interactive prompts.

mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use price_map_cli_utils::{IndicatifProgress, MultiProgress};
use price_map_crawl::{CrawlConfig, CrawlError};
use price_map_grid_models::Coordinate;
use price_map_source::progress::null_progress;
use price_map_source_models::HousingType;

#[derive(Parser)]
#[command(
    name = "price_map",
    about = "Tile a region and collect housing price statistics per tile"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the region and write one CSV row per tile
    Crawl {
        #[command(flatten)]
        args: CrawlArgs,
    },
    /// Print the tile plan without sending any requests
    Tiles {
        #[command(flatten)]
        args: CrawlArgs,
    },
    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        args: CrawlArgs,
    },
}

/// Flags shared by every subcommand. Each one overrides the config file.
#[derive(Args, Debug, Default)]
struct CrawlArgs {
    /// TOML file with crawl settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// North-west corner of the region as "lat,lon"
    #[arg(long, allow_hyphen_values = true)]
    start_top_left: Option<Coordinate>,
    /// South-east corner of the region as "lat,lon"
    #[arg(long, allow_hyphen_values = true)]
    end_bottom_right: Option<Coordinate>,
    /// Tile height in decimal degrees
    #[arg(long)]
    step_lat: Option<f64>,
    /// Tile width in decimal degrees
    #[arg(long)]
    step_lon: Option<f64>,
    /// Tile height and width in decimal degrees
    #[arg(long, conflicts_with_all = ["step_lat", "step_lon"])]
    step: Option<f64>,
    /// Housing type ("apartment" or "house")
    #[arg(long)]
    housing_type: Option<HousingType>,
    /// Target living area in square meters
    #[arg(long)]
    surface: Option<u32>,
    /// Pause after each request, in seconds
    #[arg(long)]
    delay_secs: Option<f64>,
    /// CSV file to write
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Base URL of the pricing API
    #[arg(long)]
    base_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Show a progress bar and log every tile
    #[arg(short, long)]
    verbose: bool,
}

impl CrawlArgs {
    /// Loads the config file (if any) and applies the flags on top.
    fn resolve(self) -> Result<CrawlConfig, CrawlError> {
        let mut config = CrawlConfig::load_or_default(self.config.as_deref())?;

        if let Some(corner) = self.start_top_left {
            config.start_top_left = corner;
        }
        if let Some(corner) = self.end_bottom_right {
            config.end_bottom_right = corner;
        }
        if let Some(step) = self.step {
            config.step_lat = step;
            config.step_lon = step;
        }
        if let Some(step) = self.step_lat {
            config.step_lat = step;
        }
        if let Some(step) = self.step_lon {
            config.step_lon = step;
        }
        if let Some(housing_type) = self.housing_type {
            config.housing_type = housing_type;
        }
        if let Some(surface) = self.surface {
            config.surface_sqm = surface;
        }
        if let Some(delay) = self.delay_secs {
            config.delay_secs = delay;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        config.verbose |= self.verbose;

        Ok(config)
    }
}

/// Runs a crawl and prints a one-line summary.
///
/// # Errors
///
/// Returns an error if the config is invalid or the output cannot be
/// written.
async fn crawl(config: &CrawlConfig, multi: &MultiProgress) -> Result<(), CrawlError> {
    let progress = if config.verbose {
        IndicatifProgress::tiles_bar(multi, "Crawling tiles")
    } else {
        null_progress()
    };

    let summary = price_map_crawl::crawl_to_file(config, &progress).await?;

    println!(
        "Wrote {} tiles to {} in {:.1?} ({} failed fetches)",
        summary.rows,
        config.output.display(),
        summary.elapsed,
        summary.failed,
    );

    Ok(())
}

/// Prints every tile of the configured grid without fetching anything.
fn print_tiles(config: &CrawlConfig) -> Result<(), CrawlError> {
    let plan = config.validate()?;

    println!("{:>6}  {:<40} BOTTOM RIGHT", "#", "TOP LEFT");
    println!("{}", "-".repeat(80));

    let mut count: u64 = 0;
    for tile in &plan.grid {
        count += 1;
        println!(
            "{count:>6}  {:<40} {}",
            tile.top_left.to_string(),
            tile.bottom_right
        );
    }

    println!();
    println!(
        "{count} tiles ({} rows x {} columns)",
        plan.grid.rows(),
        plan.grid.columns()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run().await;
    };

    match command {
        Commands::Crawl { args } => {
            let config = args.resolve()?;
            let multi = price_map_cli_utils::init_logger(config.verbose);
            log::debug!("Resolved crawl config: {config:?}");
            crawl(&config, &multi).await?;
        }
        Commands::Tiles { args } => {
            let config = args.resolve()?;
            let _ = price_map_cli_utils::init_logger(config.verbose);
            log::debug!("Resolved crawl config: {config:?}");
            print_tiles(&config)?;
        }
        Commands::Config { args } => {
            let config = args.resolve()?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
