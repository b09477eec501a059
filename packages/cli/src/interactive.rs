//! Interactive prompts for the price map crawler.
//!
//! Walks through every crawl setting with `dialoguer`, pre-filled with the
//! defaults, so a crawl can be started without memorizing CLI flags.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use price_map_crawl::CrawlConfig;
use price_map_grid_models::Coordinate;
use price_map_source_models::HousingType;

/// Top-level actions available in the interactive menu.
enum Action {
    Crawl,
    PreviewTiles,
    PrintConfig,
}

impl Action {
    const ALL: &[Self] = &[Self::Crawl, Self::PreviewTiles, Self::PrintConfig];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Crawl => "Crawl prices",
            Self::PreviewTiles => "Preview tiles (no requests)",
            Self::PrintConfig => "Print config as TOML",
        }
    }
}

/// Prompts for an action and the crawl settings, then runs it.
///
/// The logger starts only once the answers are in, so "Show progress?"
/// decides whether per-tile lines are logged.
///
/// # Errors
///
/// Returns an error if a prompt fails, the settings are invalid, or the
/// crawl cannot write its output.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let action = &Action::ALL[idx];
    let config = prompt_config(action)?;

    let multi = price_map_cli_utils::init_logger(logs_progress(action, &config));
    log::debug!("Resolved crawl config: {config:?}");

    match action {
        Action::Crawl => crate::crawl(&config, &multi).await?,
        Action::PreviewTiles => crate::print_tiles(&config)?,
        Action::PrintConfig => print!("{}", config.to_toml_string()?),
    }

    Ok(())
}

/// Whether the chosen action should raise logging to `info`.
const fn logs_progress(action: &Action, config: &CrawlConfig) -> bool {
    matches!(action, Action::Crawl) && config.verbose
}

/// Asks for each setting, offering the defaults.
fn prompt_config(action: &Action) -> Result<CrawlConfig, Box<dyn std::error::Error>> {
    let defaults = CrawlConfig::default();

    let start_top_left = prompt_coordinate("North-west corner (lat,lon)", defaults.start_top_left)?;
    let end_bottom_right =
        prompt_coordinate("South-east corner (lat,lon)", defaults.end_bottom_right)?;

    let step_lat: f64 = Input::new()
        .with_prompt("Tile height (degrees latitude)")
        .default(defaults.step_lat)
        .interact_text()?;
    let step_lon: f64 = Input::new()
        .with_prompt("Tile width (degrees longitude)")
        .default(step_lat)
        .interact_text()?;

    if matches!(action, Action::PreviewTiles) {
        return Ok(CrawlConfig {
            start_top_left,
            end_bottom_right,
            step_lat,
            step_lon,
            ..defaults
        });
    }

    let housing_labels: Vec<String> = HousingType::ALL.iter().map(ToString::to_string).collect();
    let housing_idx = Select::new()
        .with_prompt("Housing type")
        .items(&housing_labels)
        .default(0)
        .interact()?;

    let surface_sqm: u32 = Input::new()
        .with_prompt("Surface (m²)")
        .default(defaults.surface_sqm)
        .validate_with(|v: &u32| {
            if *v > 0 {
                Ok(())
            } else {
                Err("surface must be positive")
            }
        })
        .interact_text()?;

    let delay_secs: f64 = Input::new()
        .with_prompt("Delay between requests (seconds)")
        .default(defaults.delay_secs)
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("Output CSV")
        .default(defaults.output.display().to_string())
        .interact_text()?;

    let verbose = Confirm::new()
        .with_prompt("Show progress?")
        .default(true)
        .interact()?;

    Ok(CrawlConfig {
        start_top_left,
        end_bottom_right,
        step_lat,
        step_lon,
        housing_type: HousingType::ALL[housing_idx],
        surface_sqm,
        delay_secs,
        output: PathBuf::from(output),
        verbose,
        ..defaults
    })
}

/// Prompts for a `"lat,lon"` pair, re-asking until it parses.
fn prompt_coordinate(
    prompt: &str,
    default: Coordinate,
) -> Result<Coordinate, Box<dyn std::error::Error>> {
    let text: String = Input::new()
        .with_prompt(prompt)
        .default(format!("{},{}", default.lat, default.lon))
        .validate_with(|s: &String| s.parse::<Coordinate>().map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;

    Ok(text.parse()?)
}
