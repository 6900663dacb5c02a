#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel boundary, measurement, and lot-shape value types.
//!
//! All coordinates live in a single metre-based projected frame (e.g.
//! GDA2020 / MGA zone 56). Callers project from geographic coordinates
//! before constructing any of these types. Every "might not be measurable"
//! quantity is an [`Option`]; zero is never used as a sentinel.

pub mod lot;

use serde::{Deserialize, Serialize};

pub use lot::{LotLabel, LotRules, LotSubtype, RegularityClass};

/// A coordinate pair in the projected metre frame.
///
/// Serializes as a two-element `[x, y]` array, matching `GeoJSON` position
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    /// Easting in metres.
    pub x: f64,
    /// Northing in metres.
    pub y: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Straight-line distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Dot product, treating both points as vectors from the origin.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// An ordered, implicitly closed polygon boundary.
///
/// Construction normalizes the input: non-finite vertices are dropped and a
/// trailing vertex equal to the first one (an explicitly closed ring) is
/// removed. A ring with fewer than three distinct vertices after
/// normalization is *degenerate*; the engines answer it with all-absent
/// results instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    /// Builds a normalized ring from raw vertices.
    #[must_use]
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points: Vec<Point> = points.into_iter().filter(|p| p.is_finite()).collect();

        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        Self { points }
    }

    /// Normalized vertices, without a closing duplicate.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of normalized vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when the ring has no vertices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of pairwise-distinct vertices.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        let mut keys: Vec<(u64, u64)> = self
            .points
            .iter()
            .map(|p| (canonical_bits(p.x), canonical_bits(p.y)))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// A ring is degenerate when it has fewer than three distinct vertices.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.distinct_count() < 3
    }

    /// Iterates the closed ring's edges, including last -> first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Arithmetic mean of the normalized vertices.
    #[must_use]
    pub fn vertex_mean(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }
}

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl From<Ring> for Vec<Point> {
    fn from(ring: Ring) -> Self {
        ring.points
    }
}

/// `-0.0` and `0.0` must compare equal when counting distinct vertices.
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
}

/// How an [`AxisFrame`]'s directions were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Eigenvectors of the vertex covariance matrix.
    Principal,
    /// Covariance was isotropic; oriented along the longest edge.
    LongestEdge,
    /// Covariance was numerically zero; the projected frame's own axes.
    AxisAligned,
}

/// An orthonormal (depth, width) frame centred on a ring's vertex mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFrame {
    /// Vertex mean of the ring the frame was derived from.
    pub centroid: Point,
    /// Unit vector along the depth axis (greatest variance).
    pub primary: Point,
    /// Unit vector along the width axis, `primary` rotated 90° anticlockwise.
    pub secondary: Point,
    /// How the directions were derived.
    pub kind: FrameKind,
}

impl AxisFrame {
    /// Projects `p` into `(depth, width)` coordinates.
    #[must_use]
    pub fn project(&self, p: Point) -> (f64, f64) {
        let d = p.minus(self.centroid);
        (d.dot(self.primary), d.dot(self.secondary))
    }

    /// Compass bearing of the depth axis in degrees, clockwise from north.
    #[must_use]
    pub fn primary_bearing(&self) -> f64 {
        let deg = self.primary.x.atan2(self.primary.y).to_degrees();
        if deg < 0.0 { deg + 360.0 } else { deg }
    }
}

/// Physical measurements extracted from a parcel boundary, in metres.
///
/// Each field is independently optional; a present value is always finite
/// and strictly positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryMetrics {
    /// Span along the primary axis.
    pub depth: Option<f64>,
    /// Span along the secondary axis.
    pub width: Option<f64>,
    /// Cross-section length at the street-facing extreme.
    pub front: Option<f64>,
    /// Cross-section length at the opposite extreme.
    pub rear: Option<f64>,
    /// Side length at the minimum-width extreme.
    pub left: Option<f64>,
    /// Side length at the maximum-width extreme.
    pub right: Option<f64>,
}

impl BoundaryMetrics {
    /// All measurements absent.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            depth: None,
            width: None,
            front: None,
            rear: None,
            left: None,
            right: None,
        }
    }

    /// Returns `true` when no measurement is present.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        self.depth.is_none()
            && self.width.is_none()
            && self.front.is_none()
            && self.rear.is_none()
            && self.left.is_none()
            && self.right.is_none()
    }
}

/// Area, perimeter, and compactness of a parcel polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonStats {
    /// Planar area in square metres.
    pub area_sqm: f64,
    /// Closed-ring perimeter in metres.
    pub perimeter_m: f64,
    /// `4·√area / perimeter`, clamped to `[0, 1]`; 1 for a square.
    pub regularity: f64,
    /// Banded description of [`Self::regularity`].
    pub regularity_class: RegularityClass,
}

/// Tunables for boundary decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Lengths below this are treated as noise and reported as absent.
    pub min_length_m: f64,
    /// Minimum half-width of the cross-section tolerance band.
    pub band_floor_m: f64,
    /// Band half-width as a fraction of the axis range, when larger than
    /// [`Self::band_floor_m`].
    pub band_fraction: f64,
    /// Covariance magnitude below which directions are considered undefined.
    pub covariance_epsilon: f64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            min_length_m: 0.05,
            band_floor_m: 0.5,
            band_fraction: 0.05,
            covariance_epsilon: 1e-9,
        }
    }
}

/// Everything measured about one parcel boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelGeometry {
    /// Cross-section and span measurements.
    pub metrics: BoundaryMetrics,
    /// Area/perimeter statistics (absent for degenerate rings).
    pub stats: Option<PolygonStats>,
    /// Bearing of the depth axis in degrees (absent for degenerate rings).
    pub depth_bearing_deg: Option<f64>,
    /// Lot-shape classification.
    pub label: LotLabel,
}
