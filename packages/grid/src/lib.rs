#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row-major tiling of a geographic bounding box.
//!
//! A [`TileGrid`] is a validated crawl region plus per-axis step sizes.
//! [`TileGrid::tiles`] walks it lazily: west to east within a row, rows
//! north to south. The last row and column are not clipped, so the covered
//! area may extend slightly past the requested south-east corner.

use std::fmt;
use std::iter::FusedIterator;

use price_map_grid_models::{Coordinate, Tile};

/// Errors raised when a crawl region cannot be tiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A corner has a NaN or infinite component.
    #[error("{corner} corner {coordinate} is not a finite coordinate")]
    NonFiniteCoordinate {
        /// Which corner (`"start"` or `"end"`).
        corner: &'static str,
        /// The rejected value.
        coordinate: Coordinate,
    },

    /// A step size is zero, negative, non-finite, or too small to move the
    /// cursor at this magnitude.
    #[error("{axis} step must be a positive number of degrees, got {step}")]
    InvalidStep {
        /// The axis the step applies to.
        axis: Axis,
        /// The rejected step.
        step: f64,
    },

    /// The start corner is not strictly north of the end corner.
    #[error("start latitude {start} must be north of end latitude {end}")]
    LatitudeOrder {
        /// Start (top-left) latitude.
        start: f64,
        /// End (bottom-right) latitude.
        end: f64,
    },

    /// The start corner is not strictly west of the end corner.
    #[error("start longitude {start} must be west of end longitude {end}")]
    LongitudeOrder {
        /// Start (top-left) longitude.
        start: f64,
        /// End (bottom-right) longitude.
        end: f64,
    },
}

/// Grid axis, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        })
    }
}

/// A validated crawl region and the step sizes used to cut it into tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    start_top_left: Coordinate,
    end_bottom_right: Coordinate,
    step_lat: f64,
    step_lon: f64,
}

impl TileGrid {
    /// Validates the region and steps.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if either corner is non-finite, a step is not
    /// a usable positive number, or `start_top_left` is not strictly
    /// north-west of `end_bottom_right`.
    pub fn new(
        start_top_left: Coordinate,
        end_bottom_right: Coordinate,
        step_lat: f64,
        step_lon: f64,
    ) -> Result<Self, GridError> {
        for (corner, coordinate) in [("start", start_top_left), ("end", end_bottom_right)] {
            if !coordinate.is_finite() {
                return Err(GridError::NonFiniteCoordinate { corner, coordinate });
            }
        }

        if !is_usable_step(step_lat, start_top_left.lat, end_bottom_right.lat) {
            return Err(GridError::InvalidStep {
                axis: Axis::Latitude,
                step: step_lat,
            });
        }
        if !is_usable_step(step_lon, start_top_left.lon, end_bottom_right.lon) {
            return Err(GridError::InvalidStep {
                axis: Axis::Longitude,
                step: step_lon,
            });
        }

        if start_top_left.lat <= end_bottom_right.lat {
            return Err(GridError::LatitudeOrder {
                start: start_top_left.lat,
                end: end_bottom_right.lat,
            });
        }
        if start_top_left.lon >= end_bottom_right.lon {
            return Err(GridError::LongitudeOrder {
                start: start_top_left.lon,
                end: end_bottom_right.lon,
            });
        }

        Ok(Self {
            start_top_left,
            end_bottom_right,
            step_lat,
            step_lon,
        })
    }

    /// Number of rows the region spans: `ceil(lat_span / step_lat)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rows(&self) -> u64 {
        ((self.start_top_left.lat - self.end_bottom_right.lat) / self.step_lat).ceil() as u64
    }

    /// Number of columns the region spans: `ceil(lon_span / step_lon)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn columns(&self) -> u64 {
        ((self.end_bottom_right.lon - self.start_top_left.lon) / self.step_lon).ceil() as u64
    }

    /// Tile count predicted from the region span, used as the progress
    /// total.
    ///
    /// Matches the number of tiles [`Self::tiles`] yields whenever the
    /// steps divide the span without floating-point drift. With drift the
    /// iterator can emit one row or column more or less than predicted.
    #[must_use]
    pub fn expected_tile_count(&self) -> u64 {
        self.rows().saturating_mul(self.columns())
    }

    /// Returns a fresh lazy iterator over the grid's tiles.
    ///
    /// Each call starts again from the top-left corner and yields the same
    /// sequence.
    #[must_use]
    pub const fn tiles(&self) -> Tiles {
        Tiles {
            start_lon: self.start_top_left.lon,
            end: self.end_bottom_right,
            step_lat: self.step_lat,
            step_lon: self.step_lon,
            cursor: self.start_top_left,
        }
    }
}

impl IntoIterator for &TileGrid {
    type Item = Tile;
    type IntoIter = Tiles;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}

/// A step is usable if it is a positive finite number that still moves the
/// cursor at both ends of the axis.
fn is_usable_step(step: f64, start: f64, end: f64) -> bool {
    #[allow(clippy::float_cmp)]
    let moves = |at: f64| at + step != at && at - step != at;

    step.is_finite() && step > 0.0 && moves(start) && moves(end)
}

/// Lazy row-major walk over a [`TileGrid`].
///
/// Holds only the cursor; one [`Tile`] is materialized per `next()` call.
#[derive(Debug, Clone)]
pub struct Tiles {
    start_lon: f64,
    end: Coordinate,
    step_lat: f64,
    step_lon: f64,
    cursor: Coordinate,
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        // Scan rows north to south, each row west to east.
        while self.cursor.lat > self.end.lat {
            if self.cursor.lon < self.end.lon {
                let tile = Tile::from_corner(self.cursor, self.step_lat, self.step_lon);
                self.cursor.lon += self.step_lon;
                log::debug!("Emitting tile {tile}");
                return Some(tile);
            }

            self.cursor = Coordinate::new(self.cursor.lat - self.step_lat, self.start_lon);
        }

        None
    }
}

impl FusedIterator for Tiles {}

/// Convenience wrapper: validates the region and returns its tile iterator.
///
/// # Errors
///
/// Returns [`GridError`] under the same conditions as [`TileGrid::new`].
pub fn generate_tiles(
    start_top_left: Coordinate,
    end_bottom_right: Coordinate,
    step_lat: f64,
    step_lon: f64,
) -> Result<Tiles, GridError> {
    Ok(TileGrid::new(start_top_left, end_bottom_right, step_lat, step_lon)?.tiles())
}
