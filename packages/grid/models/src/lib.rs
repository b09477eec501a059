#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and tile types for the price map grid.
//!
//! All positions are decimal degrees. No range checking is done here:
//! latitudes and longitudes are treated as plain `f64` values and the grid
//! crate decides what a sane region looks like.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Column names for the four boundary fields of a tile, in output order.
pub const BOUNDARY_FIELDS: [&str; 4] = [
    "TopLeftLat",
    "TopLeftLon",
    "BottomRightLat",
    "BottomRightLon",
];

/// A `(latitude, longitude)` pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude (positive north).
    pub lat: f64,
    /// Longitude (positive east).
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns `true` if both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Error returned when a `"lat,lon"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate '{input}': expected \"lat,lon\" in decimal degrees")]
pub struct CoordinateParseError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    /// Parses `"59.415335,17.868951"` (whitespace around either part is
    /// ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordinateParseError {
            input: s.to_owned(),
        };

        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| err())?;
        let lon = lon.trim().parse::<f64>().map_err(|_| err())?;

        Ok(Self { lat, lon })
    }
}

/// A rectangular sub-area of a crawl region.
///
/// `top_left` is the north-west corner and `bottom_right` the south-east
/// corner. Tiles produced from a well-ordered region always satisfy
/// `top_left.lat > bottom_right.lat` and `top_left.lon < bottom_right.lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub top_left: Coordinate,
    pub bottom_right: Coordinate,
}

impl Tile {
    /// Builds the tile anchored at `top_left` that extends `height` degrees
    /// south and `width` degrees east.
    #[must_use]
    pub fn from_corner(top_left: Coordinate, height: f64, width: f64) -> Self {
        Self {
            top_left,
            bottom_right: Coordinate::new(top_left.lat - height, top_left.lon + width),
        }
    }

    /// The four boundary values in [`BOUNDARY_FIELDS`] order.
    #[must_use]
    pub const fn boundary(&self) -> [f64; 4] {
        [
            self.top_left.lat,
            self.top_left.lon,
            self.bottom_right.lat,
            self.bottom_right.lon,
        ]
    }

    /// Returns `true` if the top-left corner is strictly north-west of the
    /// bottom-right corner.
    #[must_use]
    pub fn is_well_ordered(&self) -> bool {
        self.top_left.lat > self.bottom_right.lat && self.top_left.lon < self.bottom_right.lon
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.top_left, self.bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pair() {
        let c: Coordinate = "59.415335,17.868951".parse().unwrap();
        assert!((c.lat - 59.415_335).abs() < f64::EPSILON);
        assert!((c.lon - 17.868_951).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_coordinate_with_whitespace_and_sign() {
        let c: Coordinate = " -33.9 , 151.2 ".parse().unwrap();
        assert!((c.lat - -33.9).abs() < f64::EPSILON);
        assert!((c.lon - 151.2).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_coordinate_without_separator() {
        let err = "59.4".parse::<Coordinate>().unwrap_err();
        assert_eq!(err.input, "59.4");
    }

    #[test]
    fn rejects_non_numeric_coordinate() {
        assert!("north,east".parse::<Coordinate>().is_err());
    }

    #[test]
    fn deserializes_coordinate_table_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            corner: Coordinate,
        }

        let w: Wrapper = toml::from_str("corner = { lat = 1.5, lon = -2.25 }").unwrap();
        assert_eq!(w.corner, Coordinate::new(1.5, -2.25));
    }

    #[test]
    fn tile_from_corner_extends_south_east() {
        let tile = Tile::from_corner(Coordinate::new(1.0, 0.0), 0.5, 0.25);
        assert_eq!(tile.bottom_right, Coordinate::new(0.5, 0.25));
        assert!(tile.is_well_ordered());
    }

    #[test]
    fn boundary_matches_field_order() {
        let tile = Tile::from_corner(Coordinate::new(1.0, 0.0), 0.5, 0.5);
        assert_eq!(tile.boundary(), [1.0, 0.0, 0.5, 0.5]);
        assert_eq!(BOUNDARY_FIELDS[0], "TopLeftLat");
        assert_eq!(BOUNDARY_FIELDS[3], "BottomRightLon");
    }

    #[test]
    fn displays_tile_corners() {
        let tile = Tile::from_corner(Coordinate::new(1.0, 0.0), 0.5, 0.5);
        assert_eq!(tile.to_string(), "(1, 0), (0.5, 0.5)");
    }

    #[test]
    fn serializes_coordinate_fields() {
        let json = serde_json::to_value(Coordinate::new(1.0, 2.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "lat": 1.0, "lon": 2.0 }));
    }
}
