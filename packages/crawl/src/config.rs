//! Crawl configuration.
//!
//! A [`CrawlConfig`] starts from built-in defaults (central Stockholm,
//! 50 m² apartments), can be overlaid with a TOML file, and is then
//! overridden field by field by the CLI. [`CrawlConfig::validate`] turns it
//! into a [`CrawlPlan`] of checked, typed values.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use price_map_grid::TileGrid;
use price_map_grid_models::Coordinate;
use price_map_source::mtop::DEFAULT_BASE_URL;
use price_map_source_models::{HousingType, QueryParams};
use serde::{Deserialize, Serialize};

use crate::CrawlError;

/// User-facing crawl settings.
///
/// Every field has a default, so a TOML file only needs the keys it wants
/// to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// North-west corner of the crawl region.
    pub start_top_left: Coordinate,
    /// South-east corner of the crawl region.
    pub end_bottom_right: Coordinate,
    /// Tile height in decimal degrees.
    pub step_lat: f64,
    /// Tile width in decimal degrees.
    pub step_lon: f64,
    pub housing_type: HousingType,
    /// Target living area in square meters. Must be positive.
    pub surface_sqm: u32,
    /// Pause after each tile, in seconds.
    pub delay_secs: f64,
    /// Path of the CSV file to write.
    pub output: PathBuf,
    /// Base URL of the pricing API.
    pub base_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Report per-tile progress.
    pub verbose: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_top_left: Coordinate::new(59.415_335, 17.868_951),
            end_bottom_right: Coordinate::new(59.240_899, 18.190_988),
            step_lat: 0.02,
            step_lon: 0.02,
            housing_type: HousingType::Apartment,
            surface_sqm: 50,
            delay_secs: 0.1,
            output: PathBuf::from("out.csv"),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: 30,
            verbose: false,
        }
    }
}

/// Checked crawl settings, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlPlan {
    pub grid: TileGrid,
    pub query: QueryParams,
    pub delay: Duration,
    pub timeout: Duration,
}

impl CrawlConfig {
    /// Parses a TOML document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Toml`] on syntax errors, unknown keys, or
    /// wrongly typed values.
    pub fn from_toml_str(toml: &str) -> Result<Self, CrawlError> {
        Ok(toml::from_str(toml)?)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::ConfigRead`] if the file cannot be read, or
    /// [`CrawlError::Toml`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CrawlError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded crawl config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CrawlError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, CrawlError> {
        toml::to_string(self).map_err(|e| CrawlError::Config {
            message: e.to_string(),
        })
    }

    /// Validates every setting and returns the typed plan.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Grid`] for a bad region or step, and
    /// [`CrawlError::Config`] for a zero surface, a negative or non-finite
    /// delay, or a zero timeout.
    pub fn validate(&self) -> Result<CrawlPlan, CrawlError> {
        let grid = TileGrid::new(
            self.start_top_left,
            self.end_bottom_right,
            self.step_lat,
            self.step_lon,
        )?;

        let surface_sqm = NonZeroU32::new(self.surface_sqm).ok_or_else(|| CrawlError::Config {
            message: "surface_sqm must be a positive number of square meters".to_owned(),
        })?;

        let delay =
            Duration::try_from_secs_f64(self.delay_secs).map_err(|_| CrawlError::Config {
                message: format!(
                    "delay_secs must be a non-negative number of seconds, got {}",
                    self.delay_secs
                ),
            })?;

        if self.timeout_secs == 0 {
            return Err(CrawlError::Config {
                message: "timeout_secs must be at least 1".to_owned(),
            });
        }

        Ok(CrawlPlan {
            grid,
            query: QueryParams::new(self.housing_type, surface_sqm),
            delay,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use price_map_grid::GridError;

    use super::*;

    #[test]
    fn defaults_validate() {
        let plan = CrawlConfig::default().validate().unwrap();
        assert_eq!(plan.query.housing_type, HousingType::Apartment);
        assert_eq!(plan.query.surface_sqm.get(), 50);
        assert_eq!(plan.delay, Duration::from_millis(100));
        assert_eq!(plan.timeout, Duration::from_secs(30));
        assert_eq!(plan.grid.expected_tile_count(), 9 * 17);
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config = CrawlConfig::from_toml_str(
            r#"
            housing_type = "house"
            surface_sqm = 120
            output = "villas.csv"

            [start_top_left]
            lat = 1.0
            lon = 0.0

            [end_bottom_right]
            lat = 0.0
            lon = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.housing_type, HousingType::House);
        assert_eq!(config.surface_sqm, 120);
        assert_eq!(config.output, PathBuf::from("villas.csv"));
        assert_eq!(config.start_top_left, Coordinate::new(1.0, 0.0));
        assert!((config.step_lat - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn accepts_api_housing_token() {
        let config = CrawlConfig::from_toml_str(r#"housing_type = "Lägenhet""#).unwrap();
        assert_eq!(config.housing_type, HousingType::Apartment);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = CrawlConfig::from_toml_str("resolution = 0.5").unwrap_err();
        assert!(matches!(err, CrawlError::Toml(_)));
    }

    #[test]
    fn rejects_zero_surface() {
        let config = CrawlConfig {
            surface_sqm: 0,
            ..CrawlConfig::default()
        };
        assert!(matches!(config.validate(), Err(CrawlError::Config { .. })));
    }

    #[test]
    fn rejects_bad_delay() {
        for delay_secs in [-0.1, f64::NAN, f64::INFINITY] {
            let config = CrawlConfig {
                delay_secs,
                ..CrawlConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(CrawlError::Config { .. })),
                "delay {delay_secs}"
            );
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = CrawlConfig {
            timeout_secs: 0,
            ..CrawlConfig::default()
        };
        assert!(matches!(config.validate(), Err(CrawlError::Config { .. })));
    }

    #[test]
    fn rejects_inverted_region() {
        let defaults = CrawlConfig::default();
        let config = CrawlConfig {
            start_top_left: defaults.end_bottom_right,
            end_bottom_right: defaults.start_top_left,
            ..defaults
        };
        assert!(matches!(
            config.validate(),
            Err(CrawlError::Grid(GridError::LatitudeOrder { .. }))
        ));
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = CrawlConfig {
            housing_type: HousingType::House,
            verbose: true,
            ..CrawlConfig::default()
        };
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(CrawlConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let path = std::env::temp_dir().join("price_map_missing_config.toml");
        let _ = std::fs::remove_file(&path);

        let err = CrawlConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("price_map_missing_config.toml"));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(
            CrawlConfig::load_or_default(None).unwrap(),
            CrawlConfig::default()
        );
    }
}
