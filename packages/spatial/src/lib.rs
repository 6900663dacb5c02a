#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory nearest-feature index for proximity banding.
//!
//! Builds an R-tree over located features (centre boundaries and points),
//! finds the feature nearest to a target point, optionally swaps the
//! straight-line estimate for an externally routed distance, and classifies
//! the result into distance bands.

use geo::Intersects;
use parcel_intel_geometry::polygon_ops::to_geo_polygon;
use parcel_intel_geometry_models::Point;
use parcel_intel_spatial_models::{
    DistanceSource, LocatedFeature, ProximityConfig, ProximityResult,
};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

pub use parcel_intel_spatial_models as models;

/// Why an external distance refinement produced nothing.
#[derive(Debug, Error)]
pub enum RefineError {
    /// The routing service found no path between the points.
    #[error("No route between the points")]
    NoRoute,

    /// The caller's deadline expired before the routing query returned.
    #[error("Routing query timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Any other routing failure.
    #[error("Routing failed: {message}")]
    Failed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Supplies a real-world (e.g. road-network) distance between two points.
///
/// Implementations typically perform network I/O and enforce their own
/// timeout. Every error is treated as "no refinement": the straight-line
/// estimate stands.
pub trait DistanceRefiner {
    /// Distance in metres from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error when no distance could be obtained.
    fn refine(&self, from: Point, to: Point) -> Result<f64, RefineError>;
}

impl<F> DistanceRefiner for F
where
    F: Fn(Point, Point) -> Option<f64>,
{
    fn refine(&self, from: Point, to: Point) -> Result<f64, RefineError> {
        self(from, to).ok_or(RefineError::NoRoute)
    }
}

/// A feature stored in the R-tree with its precomputed geometry.
struct FeatureEntry {
    /// Position in the caller's feature list; breaks distance ties.
    position: usize,
    label: String,
    shape: EntryShape,
    centroid: Option<Point>,
    envelope: AABB<[f64; 2]>,
}

enum EntryShape {
    Boundary {
        polygon: geo::Polygon<f64>,
        vertices: Vec<Point>,
    },
    Centroid(Point),
}

impl RTreeObject for FeatureEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl FeatureEntry {
    fn from_feature(position: usize, feature: &LocatedFeature) -> Option<Self> {
        let centroid = feature.usable_centroid();

        let (shape, envelope) = if let Some(ring) = feature.usable_boundary() {
            let polygon = to_geo_polygon(ring);
            let envelope = compute_envelope(&polygon);
            (
                EntryShape::Boundary {
                    polygon,
                    vertices: ring.points().to_vec(),
                },
                envelope,
            )
        } else if let Some(point) = centroid {
            (EntryShape::Centroid(point), AABB::from_point([point.x, point.y]))
        } else {
            return None;
        };

        Some(Self {
            position,
            label: feature.label.clone(),
            shape,
            centroid,
            envelope,
        })
    }

    /// Straight-line distance from `target`: zero inside or on the boundary,
    /// else to the nearest boundary vertex; centroid distance without a
    /// boundary.
    fn distance(&self, target: Point) -> (f64, DistanceSource) {
        match &self.shape {
            EntryShape::Boundary { polygon, vertices } => {
                if polygon.intersects(&geo::Point::new(target.x, target.y)) {
                    return (0.0, DistanceSource::Contained);
                }
                let nearest = vertices
                    .iter()
                    .map(|v| v.distance(target))
                    .fold(f64::INFINITY, f64::min);
                (nearest, DistanceSource::Boundary)
            }
            EntryShape::Centroid(point) => (point.distance(target), DistanceSource::Centroid),
        }
    }
}

/// Candidate nearest feature before refinement and banding.
struct Nearest<'a> {
    entry: &'a FeatureEntry,
    distance: f64,
    source: DistanceSource,
}

/// Pre-built spatial index over a set of located features.
///
/// Constructed once per feature set and queried for any number of targets.
pub struct ProximityIndex {
    features: RTree<FeatureEntry>,
    config: ProximityConfig,
}

impl ProximityIndex {
    /// Indexes `features`. Features with neither a usable boundary nor a
    /// finite centroid are skipped.
    #[must_use]
    pub fn new(features: &[LocatedFeature], config: ProximityConfig) -> Self {
        let entries: Vec<FeatureEntry> = features
            .iter()
            .enumerate()
            .filter_map(|(position, feature)| {
                let entry = FeatureEntry::from_feature(position, feature);
                if entry.is_none() {
                    log::warn!("Skipping feature '{}' with no usable location", feature.label);
                }
                entry
            })
            .collect();

        log::debug!("Loaded {} features into proximity index", entries.len());

        Self {
            features: RTree::bulk_load(entries),
            config,
        }
    }

    /// Number of indexed features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.size()
    }

    /// Returns `true` when no feature was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.size() == 0
    }

    /// The active banding thresholds.
    #[must_use]
    pub const fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Nearest feature to `target` by straight-line distance, banded.
    ///
    /// `None` when nothing is indexed or the nearest feature lies beyond the
    /// cutoff.
    #[must_use]
    pub fn nearest(&self, target: Point) -> Option<ProximityResult> {
        self.search(target, None)
    }

    /// Like [`Self::nearest`], but asks `refiner` for a routed distance to
    /// the chosen feature's centroid. A failed or non-finite refinement
    /// keeps the straight-line estimate.
    #[must_use]
    pub fn nearest_refined(
        &self,
        target: Point,
        refiner: &dyn DistanceRefiner,
    ) -> Option<ProximityResult> {
        self.search(target, Some(refiner))
    }

    fn search(
        &self,
        target: Point,
        refiner: Option<&dyn DistanceRefiner>,
    ) -> Option<ProximityResult> {
        if !target.is_finite() {
            log::debug!("Non-finite proximity target {target:?}");
            return None;
        }

        let nearest = self.closest(target)?;
        let straight_line_m = nearest.distance;

        let (distance_m, source) = match (refiner, nearest.entry.centroid) {
            (Some(refiner), Some(centroid)) => match refiner.refine(target, centroid) {
                Ok(routed) if routed.is_finite() && routed >= 0.0 => {
                    (routed, DistanceSource::Routed)
                }
                Ok(routed) => {
                    log::warn!(
                        "Ignoring invalid routed distance {routed} to '{}'",
                        nearest.entry.label
                    );
                    (straight_line_m, nearest.source)
                }
                Err(e) => {
                    log::warn!(
                        "Routed distance to '{}' unavailable, keeping straight line: {e}",
                        nearest.entry.label
                    );
                    (straight_line_m, nearest.source)
                }
            },
            _ => (straight_line_m, nearest.source),
        };

        let Some(band) = self.config.band_for(distance_m) else {
            log::debug!(
                "Nearest feature '{}' at {distance_m:.1} m is beyond the {} m cutoff",
                nearest.entry.label,
                self.config.cutoff_m
            );
            return None;
        };

        Some(ProximityResult {
            label: nearest.entry.label.clone(),
            distance_m,
            straight_line_m,
            band,
            source,
        })
    }

    /// Closest entry by straight-line distance, earliest position on ties.
    ///
    /// Searches the cutoff window first; anything closer than the cutoff must
    /// have an envelope inside it. Falls back to a full scan so a refinement
    /// can still be attempted for a feature just outside the window.
    fn closest(&self, target: Point) -> Option<Nearest<'_>> {
        let reach = self.config.cutoff_m.max(0.0);
        let window = AABB::from_corners(
            [target.x - reach, target.y - reach],
            [target.x + reach, target.y + reach],
        );

        let windowed = pick_closest(self.features.locate_in_envelope_intersecting(&window), target);
        match windowed {
            Some(found) if found.distance <= reach => Some(found),
            _ => pick_closest(self.features.iter(), target),
        }
    }
}

fn pick_closest<'a>(
    entries: impl Iterator<Item = &'a FeatureEntry>,
    target: Point,
) -> Option<Nearest<'a>> {
    let mut best: Option<Nearest<'a>> = None;

    for entry in entries {
        let (distance, source) = entry.distance(target);
        if !distance.is_finite() {
            continue;
        }
        let better = match &best {
            None => true,
            Some(current) => {
                distance < current.distance
                    || (distance <= current.distance && entry.position < current.entry.position)
            }
        };
        if better {
            best = Some(Nearest {
                entry,
                distance,
                source,
            });
        }
    }

    best
}

/// Finds and bands the feature nearest to `target`.
///
/// Convenience for one-off queries; build a [`ProximityIndex`] to query the
/// same features repeatedly.
#[must_use]
pub fn nearest_feature(
    target: Point,
    features: &[LocatedFeature],
    refiner: Option<&dyn DistanceRefiner>,
    config: &ProximityConfig,
) -> Option<ProximityResult> {
    ProximityIndex::new(features, *config).search(target, refiner)
}

/// Compute the bounding box envelope for a boundary polygon.
fn compute_envelope(polygon: &geo::Polygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use parcel_intel_geometry_models::Ring;
    use parcel_intel_spatial_models::ProximityBand;

    use super::*;

    fn square(label: &str, x0: f64, y0: f64, size: f64) -> LocatedFeature {
        LocatedFeature::with_boundary(
            label,
            Ring::new(vec![
                Point::new(x0, y0),
                Point::new(x0 + size, y0),
                Point::new(x0 + size, y0 + size),
                Point::new(x0, y0 + size),
            ]),
        )
    }

    fn config() -> ProximityConfig {
        ProximityConfig::default()
    }

    #[test]
    fn picks_nearest_point_feature() {
        let features = vec![
            LocatedFeature::at_point("far", Point::new(1000.0, 0.0)),
            LocatedFeature::at_point("near", Point::new(300.0, 0.0)),
        ];
        let r = nearest_feature(Point::new(0.0, 0.0), &features, None, &config()).unwrap();
        assert_eq!(r.label, "near");
        assert!((r.distance_m - 300.0).abs() < 1e-9);
        assert_eq!(r.band, ProximityBand::Inner);
        assert_eq!(r.source, DistanceSource::Centroid);
    }

    #[test]
    fn inside_boundary_is_zero_distance() {
        let features = vec![
            LocatedFeature::at_point("station", Point::new(50.0, 50.0)),
            square("centre", 0.0, 0.0, 200.0),
        ];
        let r = nearest_feature(Point::new(120.0, 80.0), &features, None, &config()).unwrap();
        assert_eq!(r.label, "centre");
        assert!(r.distance_m.abs() < f64::EPSILON);
        assert_eq!(r.source, DistanceSource::Contained);
        assert_eq!(r.band, ProximityBand::Inner);
    }

    #[test]
    fn on_boundary_counts_as_contained() {
        let r = nearest_feature(
            Point::new(100.0, 0.0),
            &[square("centre", 0.0, 0.0, 200.0)],
            None,
            &config(),
        )
        .unwrap();
        assert_eq!(r.source, DistanceSource::Contained);
    }

    #[test]
    fn outside_boundary_uses_nearest_vertex() {
        let r = nearest_feature(
            Point::new(-300.0, -400.0),
            &[square("centre", 0.0, 0.0, 200.0)],
            None,
            &config(),
        )
        .unwrap();
        assert!((r.distance_m - 500.0).abs() < 1e-9);
        assert_eq!(r.source, DistanceSource::Boundary);
        assert_eq!(r.band, ProximityBand::Outer);
    }

    #[test]
    fn beyond_cutoff_is_none() {
        let features = vec![LocatedFeature::at_point("centre", Point::new(2000.0, 0.0))];
        assert!(nearest_feature(Point::new(0.0, 0.0), &features, None, &config()).is_none());
    }

    #[test]
    fn between_outer_band_and_cutoff_is_unbanded() {
        let features = vec![LocatedFeature::at_point("centre", Point::new(0.0, 1200.0))];
        let r = nearest_feature(Point::new(0.0, 0.0), &features, None, &config()).unwrap();
        assert_eq!(r.band, ProximityBand::Unbanded);
    }

    #[test]
    fn refinement_replaces_straight_line() {
        let features = vec![LocatedFeature::at_point("station", Point::new(300.0, 0.0))];
        let road = |_: Point, _: Point| Some(650.0);
        let r = nearest_feature(Point::new(0.0, 0.0), &features, Some(&road), &config()).unwrap();
        assert!((r.distance_m - 650.0).abs() < 1e-9);
        assert!((r.straight_line_m - 300.0).abs() < 1e-9);
        assert_eq!(r.source, DistanceSource::Routed);
        assert_eq!(r.band, ProximityBand::Outer);
    }

    #[test]
    fn failed_refinement_keeps_straight_line() {
        struct TimesOut;
        impl DistanceRefiner for TimesOut {
            fn refine(&self, _: Point, _: Point) -> Result<f64, RefineError> {
                Err(RefineError::Timeout(Duration::from_secs(5)))
            }
        }

        let features = vec![LocatedFeature::at_point("station", Point::new(300.0, 0.0))];
        let r = nearest_feature(Point::new(0.0, 0.0), &features, Some(&TimesOut), &config())
            .unwrap();
        assert!((r.distance_m - 300.0).abs() < 1e-9);
        assert_eq!(r.source, DistanceSource::Centroid);

        let no_route = |_: Point, _: Point| -> Option<f64> { None };
        let r = nearest_feature(Point::new(0.0, 0.0), &features, Some(&no_route), &config())
            .unwrap();
        assert!((r.distance_m - 300.0).abs() < 1e-9);

        let nonsense = |_: Point, _: Point| Some(f64::NAN);
        let r = nearest_feature(Point::new(0.0, 0.0), &features, Some(&nonsense), &config())
            .unwrap();
        assert!((r.distance_m - 300.0).abs() < 1e-9);
    }

    #[test]
    fn refinement_beyond_cutoff_discards() {
        let features = vec![LocatedFeature::at_point("station", Point::new(900.0, 0.0))];
        let detour = |_: Point, _: Point| Some(1800.0);
        assert!(
            nearest_feature(Point::new(0.0, 0.0), &features, Some(&detour), &config()).is_none()
        );
    }

    #[test]
    fn refinement_can_bring_a_far_feature_inside_cutoff() {
        let features = vec![LocatedFeature::at_point("ferry", Point::new(1600.0, 0.0))];
        let ferry = |_: Point, _: Point| Some(1400.0);
        let r = nearest_feature(Point::new(0.0, 0.0), &features, Some(&ferry), &config()).unwrap();
        assert_eq!(r.label, "ferry");
        assert_eq!(r.band, ProximityBand::Unbanded);
    }

    #[test]
    fn refiner_receives_target_and_centroid() {
        let calls = Cell::new(0);
        let features = vec![LocatedFeature::at_point("station", Point::new(10.0, 20.0))];
        let check = |from: Point, to: Point| {
            calls.set(calls.get() + 1);
            assert_eq!(from, Point::new(1.0, 2.0));
            assert_eq!(to, Point::new(10.0, 20.0));
            Some(50.0)
        };
        nearest_feature(Point::new(1.0, 2.0), &features, Some(&check), &config()).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn boundary_only_feature_is_not_refined() {
        let road = |_: Point, _: Point| Some(1.0);
        let r = nearest_feature(
            Point::new(-300.0, -400.0),
            &[square("centre", 0.0, 0.0, 200.0)],
            Some(&road),
            &config(),
        )
        .unwrap();
        assert_eq!(r.source, DistanceSource::Boundary);
        assert!((r.distance_m - 500.0).abs() < 1e-9);
    }

    #[test]
    fn ties_go_to_earliest_feature() {
        let features = vec![
            LocatedFeature::at_point("east", Point::new(100.0, 0.0)),
            LocatedFeature::at_point("west", Point::new(-100.0, 0.0)),
            LocatedFeature::at_point("north", Point::new(0.0, 100.0)),
        ];
        let index = ProximityIndex::new(&features, config());
        assert_eq!(index.nearest(Point::new(0.0, 0.0)).unwrap().label, "east");
    }

    #[test]
    fn unusable_features_are_skipped() {
        let features = vec![
            LocatedFeature {
                label: "ghost".to_string(),
                boundary: None,
                centroid: None,
            },
            LocatedFeature {
                label: "flat".to_string(),
                boundary: Some(Ring::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)])),
                centroid: Some(Point::new(700.0, 0.0)),
            },
        ];
        let index = ProximityIndex::new(&features, config());
        assert_eq!(index.len(), 1);
        let r = index.nearest(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(r.label, "flat");
        assert_eq!(r.source, DistanceSource::Centroid);
        assert!((r.distance_m - 700.0).abs() < 1e-9);
    }

    #[test]
    fn empty_or_non_finite_queries_are_none() {
        assert!(nearest_feature(Point::new(0.0, 0.0), &[], None, &config()).is_none());
        let features = vec![LocatedFeature::at_point("a", Point::new(1.0, 1.0))];
        assert!(nearest_feature(Point::new(f64::NAN, 0.0), &features, None, &config()).is_none());
        assert!(ProximityIndex::new(&[], config()).is_empty());
    }

    #[test]
    fn custom_thresholds() {
        let tight = ProximityConfig {
            inner_band_m: 100.0,
            outer_band_m: 200.0,
            cutoff_m: 250.0,
        };
        let features = vec![LocatedFeature::at_point("a", Point::new(150.0, 0.0))];
        let r = nearest_feature(Point::new(0.0, 0.0), &features, None, &tight).unwrap();
        assert_eq!(r.band, ProximityBand::Outer);
        let features = vec![LocatedFeature::at_point("a", Point::new(300.0, 0.0))];
        assert!(nearest_feature(Point::new(0.0, 0.0), &features, None, &tight).is_none());
    }

    #[test]
    fn boundary_envelope_spans_the_ring() {
        let feature = square("centre", 334_000.0, 6_250_000.0, 200.0);
        let entry = FeatureEntry::from_feature(0, &feature).unwrap();
        let envelope = entry.envelope();
        assert_eq!(envelope.lower(), [334_000.0, 6_250_000.0]);
        assert_eq!(envelope.upper(), [334_200.0, 6_250_200.0]);

        let point = LocatedFeature::at_point("station", Point::new(5.0, 7.0));
        let entry = FeatureEntry::from_feature(1, &point).unwrap();
        assert_eq!(entry.envelope().lower(), [5.0, 7.0]);
    }

    #[test]
    fn repeated_queries_agree() {
        let features = vec![
            square("centre", 0.0, 0.0, 200.0),
            LocatedFeature::at_point("station", Point::new(600.0, 600.0)),
        ];
        let index = ProximityIndex::new(&features, config());
        let target = Point::new(450.0, 500.0);
        assert_eq!(index.nearest(target), index.nearest(target));
    }
}
