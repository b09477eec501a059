//! HTTP client for the "mellan tummen och pekfingret" price map API.
//!
//! The API answers one bounding box per request. The box and the housing
//! parameters are encoded in the path:
//!
//! ```text
//! {base}/{top_lat},{left_lon},{bottom_lat},{right_lon}/{housing}/{surface}
//! ```
//!
//! and the response is a JSON object of aggregated statistics plus an
//! `Estates` array with the individual listings, which this crate drops.

use std::time::Duration;

use async_trait::async_trait;
use price_map_grid_models::Tile;
use price_map_source_models::{FetchFailure, FetchOutcome, QueryParams, TileStats};

use crate::{SourceError, TileFetcher};

/// Public endpoint of the price map API.
pub const DEFAULT_BASE_URL: &str = "https://www.svenskfast.se/api/v1/mtop";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the nested per-listing payload in responses.
const LISTINGS_FIELD: &str = "Estates";

/// Maximum length of the response body preview included in logs.
const BODY_PREVIEW_LEN: usize = 200;

/// [`TileFetcher`] backed by the price map HTTP API.
#[derive(Debug, Clone)]
pub struct MtopFetcher {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl MtopFetcher {
    /// Creates a fetcher for `base_url` whose requests give up after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if `base_url` is not an absolute URL that
    /// accepts path segments, or if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = reqwest::Url::parse(base_url).map_err(|e| SourceError::InvalidBaseUrl {
            url: base_url.to_owned(),
            message: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "URL cannot have path segments".to_owned(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Builds the request URL for `tile` and `query`.
    #[must_use]
    pub fn request_url(&self, tile: &Tile, query: &QueryParams) -> reqwest::Url {
        let bbox = format!(
            "{},{},{},{}",
            tile.top_left.lat, tile.top_left.lon, tile.bottom_right.lat, tile.bottom_right.lon,
        );
        let surface = query.surface_sqm.to_string();

        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&bbox)
                .push(query.housing_type.api_token())
                .push(&surface);
        }
        url
    }
}

#[async_trait]
impl TileFetcher for MtopFetcher {
    fn name(&self) -> &'static str {
        "mtop"
    }

    async fn fetch(&self, tile: &Tile, query: &QueryParams) -> FetchOutcome {
        let url = self.request_url(tile, query);
        log::debug!("Fetching {url}");

        let outcome = match self.client.get(url).send().await {
            Err(e) => FetchOutcome::Failed(FetchFailure::Transport {
                message: e.to_string(),
            }),
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => classify_response(status, &body),
                    Err(e) => FetchOutcome::Failed(FetchFailure::Body {
                        message: e.to_string(),
                    }),
                }
            }
        };

        if let Some(failure) = outcome.failure() {
            log::warn!("Tile {tile}: {failure}, writing empty record");
        }

        outcome
    }
}

/// Turns a raw API response into a [`FetchOutcome`].
///
/// Any 2xx status with a JSON object body is a success; the listings
/// payload is stripped and missing statistics default to zero. Everything
/// else is a failure.
#[must_use]
pub fn classify_response(status: u16, body: &str) -> FetchOutcome {
    if !(200..300).contains(&status) {
        return FetchOutcome::Failed(FetchFailure::Status { status });
    }

    let mut value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Unparseable body ({e}): {}", preview(body));
            return FetchOutcome::Failed(FetchFailure::Malformed {
                message: e.to_string(),
            });
        }
    };

    let Some(object) = value.as_object_mut() else {
        return FetchOutcome::Failed(FetchFailure::Malformed {
            message: "expected a JSON object".to_owned(),
        });
    };
    object.remove(LISTINGS_FIELD);

    match serde_json::from_value::<TileStats>(value) {
        Ok(stats) => FetchOutcome::Found(stats),
        Err(e) => FetchOutcome::Failed(FetchFailure::Malformed {
            message: e.to_string(),
        }),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
