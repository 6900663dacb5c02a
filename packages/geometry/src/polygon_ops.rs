//! Area, perimeter, regularity, bearings, and corner-lot detection.

use geo::{Area, Euclidean, Intersects, Length, LineString, Polygon};
use parcel_intel_geometry_models::{LotRules, Point, PolygonStats, Ring};

/// Converts a ring into a hole-free `geo` polygon (closed automatically).
#[must_use]
pub fn to_geo_polygon(ring: &Ring) -> Polygon<f64> {
    let exterior: LineString<f64> = ring.points().iter().map(|p| (p.x, p.y)).collect();
    Polygon::new(exterior, vec![])
}

/// Closed-ring perimeter in metres. Zero for empty rings.
#[must_use]
pub fn perimeter(ring: &Ring) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    Euclidean.length(to_geo_polygon(ring).exterior())
}

/// Area, perimeter, and regularity of a ring; `None` when degenerate.
///
/// Regularity compares the perimeter against the smallest perimeter that
/// could enclose the same area with a square (`4·√area`), so a square scores
/// 1 and elongated or jagged lots score lower.
#[must_use]
pub fn polygon_stats(ring: &Ring, rules: &LotRules) -> Option<PolygonStats> {
    if ring.is_degenerate() {
        return None;
    }

    let area_sqm = to_geo_polygon(ring).unsigned_area();
    let perimeter_m = perimeter(ring);
    if !area_sqm.is_finite() || !perimeter_m.is_finite() || perimeter_m <= 0.0 {
        return None;
    }

    let regularity = (4.0 * area_sqm.sqrt() / perimeter_m).clamp(0.0, 1.0);

    Some(PolygonStats {
        area_sqm,
        perimeter_m,
        regularity,
        regularity_class: rules.regularity_class(regularity),
    })
}

/// Compass bearing from `from` to `to` in degrees, clockwise from +y.
///
/// Coincident points yield 0.
#[must_use]
pub fn bearing(from: Point, to: Point) -> f64 {
    let deg = (to.x - from.x).atan2(to.y - from.y).to_degrees();
    if deg < 0.0 { deg + 360.0 } else { deg }
}

/// A parcel touching two or more distinct road polygons is a corner lot.
///
/// Degenerate parcel or road rings never count.
#[must_use]
pub fn is_corner_lot(parcel: &Ring, roads: &[Ring]) -> bool {
    if parcel.is_degenerate() {
        return false;
    }
    let parcel = to_geo_polygon(parcel);

    let touching = roads
        .iter()
        .filter(|road| !road.is_degenerate())
        .filter(|road| parcel.intersects(&to_geo_polygon(road)))
        .count();

    log::trace!("Parcel intersects {touching} of {} road polygons", roads.len());
    touching >= 2
}
