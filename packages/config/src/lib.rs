#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Engine tunables loaded from TOML.
//!
//! Every threshold the engines use lives in one of four tables. A partial
//! override file only needs the keys it changes:
//!
//! ```toml
//! [proximity]
//! cutoff_m = 2000.0
//! ```

use std::path::Path;

use parcel_intel_geometry_models::{BoundaryConfig, LotRules};
use parcel_intel_reconcile_models::ReconcileConfig;
use parcel_intel_spatial_models::ProximityConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The shipped defaults, kept in sync with [`EngineConfig::default`] by a
/// test.
pub const DEFAULTS_TOML: &str = include_str!("../defaults.toml");

/// Errors from loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has mistyped fields.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Values parse but make no sense together.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Which constraint failed.
        message: String,
    },
}

/// All engine tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Boundary decomposition.
    pub boundary: BoundaryConfig,
    /// Lot-shape heuristics and regularity bands.
    pub lot_rules: LotRules,
    /// Attribute reconciliation.
    pub reconcile: ReconcileConfig,
    /// Proximity banding.
    pub proximity: ProximityConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// * If the document is not valid TOML
    /// * If a value fails [`Self::validate`]
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the contents fail [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.boundary;
        non_negative("boundary.min_length_m", b.min_length_m)?;
        non_negative("boundary.band_floor_m", b.band_floor_m)?;
        non_negative("boundary.band_fraction", b.band_fraction)?;
        non_negative("boundary.covariance_epsilon", b.covariance_epsilon)?;

        let r = &self.lot_rules;
        non_negative("lot_rules.restricted_front_ratio", r.restricted_front_ratio)?;
        non_negative("lot_rules.restricted_front_max_m", r.restricted_front_max_m)?;
        non_negative("lot_rules.front_wider_ratio", r.front_wider_ratio)?;
        non_negative("lot_rules.rear_wider_ratio", r.rear_wider_ratio)?;
        non_negative("lot_rules.irregular_side_ratio", r.irregular_side_ratio)?;
        non_negative("lot_rules.regular_min", r.regular_min)?;
        non_negative("lot_rules.mildly_irregular_min", r.mildly_irregular_min)?;
        ascending(
            ("lot_rules.mildly_irregular_min", r.mildly_irregular_min),
            ("lot_rules.regular_min", r.regular_min),
        )?;
        ascending(
            ("lot_rules.rear_wider_ratio", r.rear_wider_ratio),
            ("lot_rules.front_wider_ratio", r.front_wider_ratio),
        )?;

        non_negative(
            "reconcile.relative_tolerance",
            self.reconcile.relative_tolerance,
        )?;

        let p = &self.proximity;
        non_negative("proximity.inner_band_m", p.inner_band_m)?;
        non_negative("proximity.outer_band_m", p.outer_band_m)?;
        non_negative("proximity.cutoff_m", p.cutoff_m)?;
        ascending(
            ("proximity.inner_band_m", p.inner_band_m),
            ("proximity.outer_band_m", p.outer_band_m),
        )?;
        ascending(
            ("proximity.outer_band_m", p.outer_band_m),
            ("proximity.cutoff_m", p.cutoff_m),
        )?;

        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        log::warn!("Rejecting configuration: {field} = {value}");
        Err(ConfigError::Invalid {
            message: format!("{field} must be finite and non-negative, got {value}"),
        })
    }
}

fn ascending((low_name, low): (&str, f64), (high_name, high): (&str, f64)) -> Result<(), ConfigError> {
    if low <= high {
        Ok(())
    } else {
        log::warn!("Rejecting configuration: {low_name} ({low}) > {high_name} ({high})");
        Err(ConfigError::Invalid {
            message: format!("{low_name} ({low}) must not exceed {high_name} ({high})"),
        })
    }
}
