#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Located feature and proximity band types for nearest-centre search.
//!
//! A [`LocatedFeature`] is something a parcel can be "near": a town centre
//! boundary, a station point. The search yields a [`ProximityResult`] whose
//! [`ProximityBand`] feeds eligibility rules evaluated elsewhere.

use parcel_intel_geometry_models::{Point, Ring};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A labelled feature with a boundary, a centroid, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedFeature {
    /// Display label (e.g. `"Dee Why town centre"`).
    pub label: String,
    /// Outline, used for containment and boundary distance.
    #[serde(default)]
    pub boundary: Option<Ring>,
    /// Representative point, used when there is no usable boundary and as
    /// the destination for routed-distance refinement.
    #[serde(default)]
    pub centroid: Option<Point>,
}

impl LocatedFeature {
    /// Creates a feature, or `None` when neither location is given.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        boundary: Option<Ring>,
        centroid: Option<Point>,
    ) -> Option<Self> {
        if boundary.is_none() && centroid.is_none() {
            return None;
        }
        Some(Self {
            label: label.into(),
            boundary,
            centroid,
        })
    }

    /// A point-only feature.
    #[must_use]
    pub fn at_point(label: impl Into<String>, centroid: Point) -> Self {
        Self {
            label: label.into(),
            boundary: None,
            centroid: Some(centroid),
        }
    }

    /// A boundary-only feature.
    #[must_use]
    pub fn with_boundary(label: impl Into<String>, boundary: Ring) -> Self {
        Self {
            label: label.into(),
            boundary: Some(boundary),
            centroid: None,
        }
    }

    /// Boundary that can take part in containment tests.
    #[must_use]
    pub fn usable_boundary(&self) -> Option<&Ring> {
        self.boundary.as_ref().filter(|ring| !ring.is_degenerate())
    }

    /// Centroid with finite coordinates.
    #[must_use]
    pub fn usable_centroid(&self) -> Option<Point> {
        self.centroid.filter(|p| p.is_finite())
    }
}

/// Discrete distance class of the nearest feature.
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
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProximityBand {
    /// Within the inner threshold.
    Inner,
    /// Beyond the inner but within the outer threshold.
    Outer,
    /// Beyond the outer threshold but still inside the cutoff.
    Unbanded,
}

/// How the reported distance was obtained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceSource {
    /// The target lies inside or on the feature boundary.
    Contained,
    /// Distance to the nearest boundary vertex.
    Boundary,
    /// Distance to the feature centroid.
    Centroid,
    /// Replaced by an external routed distance.
    Routed,
}

/// The nearest feature and how far away it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityResult {
    /// Label of the nearest feature.
    pub label: String,
    /// Final distance in metres (routed when refinement succeeded).
    pub distance_m: f64,
    /// Straight-line distance in metres, before any refinement.
    pub straight_line_m: f64,
    /// Distance class.
    pub band: ProximityBand,
    /// Where [`Self::distance_m`] came from.
    pub source: DistanceSource,
}

/// Distance thresholds for banding, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Upper bound (inclusive) of [`ProximityBand::Inner`].
    pub inner_band_m: f64,
    /// Upper bound (inclusive) of [`ProximityBand::Outer`].
    pub outer_band_m: f64,
    /// Results farther than this are discarded.
    pub cutoff_m: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            inner_band_m: 400.0,
            outer_band_m: 800.0,
            cutoff_m: 1500.0,
        }
    }
}

impl ProximityConfig {
    /// Bands a distance; `None` beyond the cutoff or for non-finite input.
    #[must_use]
    pub fn band_for(&self, distance_m: f64) -> Option<ProximityBand> {
        if !distance_m.is_finite() || distance_m < 0.0 || distance_m > self.cutoff_m {
            None
        } else if distance_m <= self.inner_band_m {
            Some(ProximityBand::Inner)
        } else if distance_m <= self.outer_band_m {
            Some(ProximityBand::Outer)
        } else {
            Some(ProximityBand::Unbanded)
        }
    }
}
