#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query parameters, per-tile statistics, and fetch outcome types.
//!
//! A [`TileRecord`] is one output row: the tile's four boundary values
//! followed by the [`TileStats`] columns. The column set and order never
//! change, whether the fetch succeeded or not.

use std::fmt;
use std::num::NonZeroU32;

use price_map_grid_models::{BOUNDARY_FIELDS, Tile};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};

/// Kind of housing the price query targets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum HousingType {
    #[serde(alias = "Lägenhet")]
    #[strum(to_string = "apartment", serialize = "Lägenhet")]
    Apartment,
    #[serde(alias = "Hus")]
    #[strum(to_string = "house", serialize = "Hus")]
    House,
}

impl HousingType {
    pub const ALL: &[Self] = &[Self::Apartment, Self::House];

    /// The path token the pricing API expects for this housing type.
    #[must_use]
    pub const fn api_token(self) -> &'static str {
        match self {
            Self::Apartment => "Lägenhet",
            Self::House => "Hus",
        }
    }
}

/// Housing parameters shared by every request in one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub housing_type: HousingType,
    /// Target living area in square meters.
    pub surface_sqm: NonZeroU32,
}

impl QueryParams {
    #[must_use]
    pub const fn new(housing_type: HousingType, surface_sqm: NonZeroU32) -> Self {
        Self {
            housing_type,
            surface_sqm,
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} m²", self.housing_type, self.surface_sqm)
    }
}

/// Aggregated price statistics the API returns for one area.
///
/// Field order here is the column order of the output table. Fields absent
/// from a response default to zero; unknown fields (including the nested
/// `Estates` listing payload) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TileStats {
    #[serde(deserialize_with = "lenient_number")]
    pub weight_price: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub weight_sqr: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub price_sqr: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub hits: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_sqr_price_interval: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_price_interval: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_zoom: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_days: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_hits: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub points_for_distance: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub sum_points_price: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub sum_points_sqr: f64,
}

impl TileStats {
    /// Column names in output order.
    pub const FIELD_NAMES: [&str; 13] = [
        "WeightPrice",
        "WeightSqr",
        "Price",
        "PriceSqr",
        "Hits",
        "PointsForSqrPriceInterval",
        "PointsForPriceInterval",
        "PointsForZoom",
        "PointsForDays",
        "PointsForHits",
        "PointsForDistance",
        "SumPointsPrice",
        "SumPointsSqr",
    ];

    /// The zero-filled record written for tiles whose fetch failed.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            weight_price: 0.0,
            weight_sqr: 0.0,
            price: 0.0,
            price_sqr: 0.0,
            hits: 0.0,
            points_for_sqr_price_interval: 0.0,
            points_for_price_interval: 0.0,
            points_for_zoom: 0.0,
            points_for_days: 0.0,
            points_for_hits: 0.0,
            points_for_distance: 0.0,
            sum_points_price: 0.0,
            sum_points_sqr: 0.0,
        }
    }

    /// Values in [`Self::FIELD_NAMES`] order.
    #[must_use]
    pub const fn values(&self) -> [f64; 13] {
        [
            self.weight_price,
            self.weight_sqr,
            self.price,
            self.price_sqr,
            self.hits,
            self.points_for_sqr_price_interval,
            self.points_for_price_interval,
            self.points_for_zoom,
            self.points_for_days,
            self.points_for_hits,
            self.points_for_distance,
            self.sum_points_price,
            self.sum_points_sqr,
        ]
    }
}

/// Accepts a JSON number, a numeric string, or `null` (read as zero).
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(Option<f64>),
        Text(String),
    }

    match Lenient::deserialize(deserializer)? {
        Lenient::Number(value) => Ok(value.unwrap_or(0.0)),
        Lenient::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{text}': {e}"))),
    }
}

/// Why a tile fetch degraded to the empty record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The API answered with a non-success status code.
    #[error("HTTP status {status}")]
    Status {
        /// Numeric status code.
        status: u16,
    },

    /// The request never produced a response (connect error, timeout).
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The response body could not be read.
    #[error("body read failed: {message}")]
    Body {
        /// Description of the failure.
        message: String,
    },

    /// The body was read but is not a statistics object.
    #[error("malformed response: {message}")]
    Malformed {
        /// Description of the failure.
        message: String,
    },
}

/// Result of querying one tile.
///
/// Both variants render as a full row; [`FetchOutcome::Failed`] renders as
/// [`TileStats::empty`]. The tag is kept so callers can tell "no data"
/// apart from "zero price" when they need to.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(TileStats),
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// Statistics to write for this outcome.
    #[must_use]
    pub const fn stats(&self) -> TileStats {
        match self {
            Self::Found(stats) => *stats,
            Self::Failed(_) => TileStats::empty(),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Found(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Number of columns in every [`TileRecord`] row.
pub const RECORD_FIELD_COUNT: usize = BOUNDARY_FIELDS.len() + TileStats::FIELD_NAMES.len();

/// One output row: the tile it describes and what the API said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub tile: Tile,
    pub outcome: FetchOutcome,
}

impl TileRecord {
    #[must_use]
    pub const fn new(tile: Tile, outcome: FetchOutcome) -> Self {
        Self { tile, outcome }
    }

    /// Column names: boundary fields, then statistic fields.
    #[must_use]
    pub fn header() -> [&'static str; RECORD_FIELD_COUNT] {
        let mut header = [""; RECORD_FIELD_COUNT];
        let (boundary, stats) = header.split_at_mut(BOUNDARY_FIELDS.len());
        boundary.copy_from_slice(&BOUNDARY_FIELDS);
        stats.copy_from_slice(&TileStats::FIELD_NAMES);
        header
    }

    /// Row values in [`Self::header`] order.
    #[must_use]
    pub fn values(&self) -> [f64; RECORD_FIELD_COUNT] {
        let mut values = [0.0; RECORD_FIELD_COUNT];
        let (boundary, stats) = values.split_at_mut(BOUNDARY_FIELDS.len());
        boundary.copy_from_slice(&self.tile.boundary());
        stats.copy_from_slice(&self.outcome.stats().values());
        values
    }
}

#[cfg(test)]
mod tests {
    use price_map_grid_models::Coordinate;

    use super::*;

    fn unit_tile() -> Tile {
        Tile::from_corner(Coordinate::new(1.0, 0.0), 0.5, 0.5)
    }

    #[test]
    fn parses_housing_type_names_and_api_tokens() {
        assert_eq!("apartment".parse::<HousingType>().unwrap(), HousingType::Apartment);
        assert_eq!("House".parse::<HousingType>().unwrap(), HousingType::House);
        assert_eq!("Lägenhet".parse::<HousingType>().unwrap(), HousingType::Apartment);
        assert_eq!("Hus".parse::<HousingType>().unwrap(), HousingType::House);
        assert!("castle".parse::<HousingType>().is_err());
    }

    #[test]
    fn housing_type_displays_english_name() {
        assert_eq!(HousingType::Apartment.to_string(), "apartment");
        assert_eq!(HousingType::House.api_token(), "Hus");
    }

    #[test]
    fn deserializes_full_response_in_field_order() {
        let body = serde_json::json!({
            "WeightPrice": 1,
            "WeightSqr": 2,
            "Price": 3,
            "PriceSqr": 4,
            "Hits": 5,
            "PointsForSqrPriceInterval": 6,
            "PointsForPriceInterval": 7,
            "PointsForZoom": 8,
            "PointsForDays": 9,
            "PointsForHits": 10,
            "PointsForDistance": 11,
            "SumPointsPrice": 12,
            "SumPointsSqr": 13,
            "Estates": [{ "Id": 1, "Price": 999_999 }]
        });

        let stats: TileStats = serde_json::from_value(body).unwrap();
        let expected: Vec<f64> = (1..=13).map(f64::from).collect();
        assert_eq!(stats.values().to_vec(), expected);
    }

    #[test]
    fn missing_and_null_fields_read_as_zero() {
        let body = serde_json::json!({ "Price": 2_500_000.5, "Hits": null });
        let stats: TileStats = serde_json::from_value(body).unwrap();
        assert!((stats.price - 2_500_000.5).abs() < f64::EPSILON);
        assert!(stats.hits.abs() < f64::EPSILON);
        assert!(stats.sum_points_sqr.abs() < f64::EPSILON);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let body = serde_json::json!({ "PriceSqr": " 48000.25 " });
        let stats: TileStats = serde_json::from_value(body).unwrap();
        assert!((stats.price_sqr - 48_000.25).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_strings_are_rejected() {
        let body = serde_json::json!({ "Price": "expensive" });
        assert!(serde_json::from_value::<TileStats>(body).is_err());
    }

    #[test]
    fn empty_stats_are_all_zero() {
        assert!(TileStats::empty().values().iter().all(|v| *v == 0.0));
        assert_eq!(TileStats::empty(), TileStats::default());
    }

    #[test]
    fn failed_outcome_renders_empty_stats() {
        let outcome = FetchOutcome::Failed(FetchFailure::Status { status: 503 });
        assert!(outcome.is_failure());
        assert_eq!(outcome.stats(), TileStats::empty());
        assert_eq!(outcome.failure().unwrap().to_string(), "HTTP status 503");
    }

    #[test]
    fn record_header_starts_with_boundary_fields() {
        let header = TileRecord::header();
        assert_eq!(header.len(), 17);
        assert_eq!(
            &header[..4],
            &["TopLeftLat", "TopLeftLon", "BottomRightLat", "BottomRightLon"]
        );
        assert_eq!(header[4], "WeightPrice");
        assert_eq!(header[16], "SumPointsSqr");
    }

    #[test]
    fn record_values_follow_header_order() {
        let stats = TileStats {
            price: 42.0,
            ..TileStats::empty()
        };
        let record = TileRecord::new(unit_tile(), FetchOutcome::Found(stats));
        let values = record.values();

        assert_eq!(&values[..4], &[1.0, 0.0, 0.5, 0.5]);
        let price_column = TileRecord::header()
            .iter()
            .position(|name| *name == "Price")
            .unwrap();
        assert!((values[price_column] - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_record_keeps_boundary() {
        let record = TileRecord::new(
            unit_tile(),
            FetchOutcome::Failed(FetchFailure::Malformed {
                message: "eof".to_owned(),
            }),
        );
        let values = record.values();
        assert_eq!(&values[..4], &[1.0, 0.0, 0.5, 0.5]);
        assert!(values[4..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn query_params_display() {
        let query = QueryParams::new(HousingType::Apartment, NonZeroU32::new(50).unwrap());
        assert_eq!(query.to_string(), "apartment of 50 m²");
    }
}
