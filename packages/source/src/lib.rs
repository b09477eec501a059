#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Tile fetcher trait and the HTTP client for the pricing API.
//!
//! A [`TileFetcher`] turns one [`Tile`] plus [`QueryParams`] into a
//! [`FetchOutcome`]. Fetching never fails from the caller's point of view:
//! every transport or response problem is folded into
//! [`FetchOutcome::Failed`], so a crawl always produces one row per tile.

pub mod mtop;
pub mod progress;

use async_trait::async_trait;
use price_map_grid_models::Tile;
use price_map_source_models::{FetchOutcome, QueryParams};

/// Errors that can occur while setting up a data source.
///
/// These only arise before the first request. Per-tile failures are
/// reported through [`FetchOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot have path segments appended.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Trait for anything that can answer a price query for one tile.
///
/// Implementations must be `Send + Sync` so a crawl can hold them across
/// await points.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Short identifier used in log messages (e.g., `"mtop"`).
    fn name(&self) -> &str;

    /// Queries the source for `tile`.
    ///
    /// Makes at most one request. Never retries.
    async fn fetch(&self, tile: &Tile, query: &QueryParams) -> FetchOutcome;
}
