#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crawl orchestration for the price map.
//!
//! [`run_crawl`] pulls tiles from a grid one at a time, queries the
//! [`TileFetcher`] for each, stamps the tile onto the result, and yields it
//! as a [`TileRecord`]. After each record it sleeps for a fixed delay to
//! stay polite to the shared API. [`crawl_to_writer`] drains that stream
//! into a [`CsvSink`].
//!
//! Everything is sequential: there is never more than one request in flight
//! and never more than one record held in memory.

pub mod config;
pub mod sink;

use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt as _};
use price_map_grid::{GridError, TileGrid};
use price_map_grid_models::Tile;
use price_map_source::mtop::MtopFetcher;
use price_map_source::progress::ProgressCallback;
use price_map_source::{SourceError, TileFetcher};
use price_map_source_models::{QueryParams, TileRecord};

pub use config::{CrawlConfig, CrawlPlan};
pub use sink::CsvSink;

/// Errors that abort a crawl.
///
/// Individual tile fetch failures are not errors; they become zero rows.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The crawl region or step sizes are invalid.
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    /// The data source could not be set up.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A setting is out of range.
    #[error("Invalid config: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`CrawlConfig`].
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The output file could not be created.
    #[error("Failed to create output {}: {source}", path.display())]
    Output {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing to the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a CSV row failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Totals reported at the end of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Data rows written (one per tile).
    pub rows: u64,
    /// Rows whose fetch failed and were written as zeros.
    pub failed: u64,
    pub elapsed: Duration,
}

/// Lazily fetches every tile in `tiles`, in order.
///
/// Each yielded [`TileRecord`] carries the tile it was fetched for. After a
/// record is yielded, the stream waits `delay` before it moves on to the
/// next tile (including after the last one). The delay is fixed: it does
/// not grow on failure.
pub fn run_crawl<'a, F, I>(
    fetcher: &'a F,
    tiles: I,
    query: QueryParams,
    delay: Duration,
) -> impl Stream<Item = TileRecord> + 'a
where
    F: TileFetcher + ?Sized,
    I: IntoIterator<Item = Tile>,
    I::IntoIter: 'a,
{
    let tiles = tiles.into_iter();

    async_stream::stream! {
        for tile in tiles {
            let outcome = fetcher.fetch(&tile, &query).await;
            yield TileRecord::new(tile, outcome);

            tokio::time::sleep(delay).await;
        }
    }
}

/// Crawls `grid` and writes one CSV row per tile to `writer`.
///
/// The header is written before the first request. Each row is flushed
/// as soon as its tile has been fetched.
///
/// # Errors
///
/// Returns [`CrawlError`] if writing to `writer` fails. Fetch failures do
/// not abort the crawl.
#[allow(clippy::future_not_send)]
pub async fn crawl_to_writer<F, W>(
    fetcher: &F,
    grid: &TileGrid,
    query: QueryParams,
    delay: Duration,
    writer: W,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(CrawlSummary, W), CrawlError>
where
    F: TileFetcher + ?Sized,
    W: std::io::Write,
{
    let start = Instant::now();
    let total = grid.expected_tile_count();

    log::info!(
        "Crawling {total} tiles of {query} via {} (delay {delay:?})",
        fetcher.name()
    );
    progress.set_total(total);

    let mut sink = CsvSink::new(writer)?;
    let mut failed: u64 = 0;
    let mut records = pin!(run_crawl(fetcher, grid, query, delay));

    while let Some(record) = records.next().await {
        let index = sink.rows() + 1;
        log::info!("Saving data for area {index}/{total}: {}", record.tile);

        sink.write(&record)?;
        if record.outcome.is_failure() {
            failed += 1;
        }

        progress.set_message(format!("tile {index}/{total}"));
        progress.inc(1);
    }

    let summary = CrawlSummary {
        rows: sink.rows(),
        failed,
        elapsed: start.elapsed(),
    };
    progress.finish(format!(
        "{} tiles written, {} failed",
        summary.rows, summary.failed
    ));

    Ok((summary, sink.into_inner()?))
}

/// Validates `config`, crawls the pricing API, and writes the CSV file
/// named in `config.output`.
///
/// # Errors
///
/// Returns [`CrawlError`] if the config is invalid, the HTTP client cannot
/// be built, or the output file cannot be created or written.
pub async fn crawl_to_file(
    config: &CrawlConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CrawlSummary, CrawlError> {
    let plan = config.validate()?;
    let fetcher = MtopFetcher::new(&config.base_url, plan.timeout)?;

    crawl_plan_to_file(&fetcher, &plan, &config.output, progress).await
}

/// Crawls a validated plan with any fetcher and writes `output`.
///
/// # Errors
///
/// Returns [`CrawlError`] if the output file cannot be created or written.
#[allow(clippy::future_not_send)]
pub async fn crawl_plan_to_file<F>(
    fetcher: &F,
    plan: &CrawlPlan,
    output: &std::path::Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CrawlSummary, CrawlError>
where
    F: TileFetcher + ?Sized,
{
    let file = std::fs::File::create(output).map_err(|source| CrawlError::Output {
        path: output.to_path_buf(),
        source,
    })?;

    let (summary, _) = crawl_to_writer(
        fetcher,
        &plan.grid,
        plan.query,
        plan.delay,
        file,
        progress,
    )
    .await?;

    log::info!(
        "Wrote {} rows to {} in {:.1?} ({} failed fetches)",
        summary.rows,
        output.display(),
        summary.elapsed,
        summary.failed,
    );

    Ok(summary)
}
