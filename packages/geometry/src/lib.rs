#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel boundary decomposition and lot-shape classification.
//!
//! Takes a parcel ring in projected metres, finds its principal axes, and
//! measures depth, width, front and rear cross-sections, and side lengths.
//! Those measurements (plus an optional cadastral subtype) drive the
//! lot-shape label. Everything here is a pure function over its inputs and
//! degrades to absent values on malformed geometry instead of failing.

pub mod classify;
pub mod decompose;
pub mod frame;
pub mod polygon_ops;

use geojson::GeoJson;
use parcel_intel_geometry_models::{
    BoundaryConfig, LotRules, LotSubtype, ParcelGeometry, Point, Ring,
};
use thiserror::Error;

pub use classify::classify_lot;
pub use decompose::decompose_boundary;
pub use frame::axis_frame;
pub use polygon_ops::{bearing, is_corner_lot, perimeter, polygon_stats};

/// Errors from turning external geometry into a [`Ring`].
#[derive(Debug, Error)]
pub enum RingParseError {
    /// The input is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The geometry is valid but not a polygon.
    #[error("Expected a Polygon or MultiPolygon geometry, found {kind}")]
    NotPolygon {
        /// What was found instead.
        kind: String,
    },
}

/// Measures, rates, and labels a parcel in one pass.
#[must_use]
pub fn describe_parcel(
    ring: &Ring,
    reference: Option<Point>,
    subtype: Option<&LotSubtype>,
    boundary: &BoundaryConfig,
    rules: &LotRules,
) -> ParcelGeometry {
    let metrics = decompose_boundary(ring, reference, boundary);

    ParcelGeometry {
        metrics,
        stats: polygon_stats(ring, rules),
        depth_bearing_deg: axis_frame(ring, boundary).map(|frame| frame.primary_bearing()),
        label: classify_lot(subtype, &metrics, rules),
    }
}

/// Parses the exterior ring of a `GeoJSON` polygon in projected metres.
///
/// Accepts a bare geometry, a `Feature`, or a `FeatureCollection` (first
/// feature). A `MultiPolygon` contributes the exterior of its first polygon;
/// interior rings are ignored.
///
/// # Errors
///
/// Returns an error if the string is not `GeoJSON` or holds no polygon.
pub fn parse_geojson_ring(geojson_str: &str) -> Result<Ring, RingParseError> {
    ring_from_geojson(geojson_str.parse::<GeoJson>()?)
}

/// Like [`parse_geojson_ring`], for input that is already parsed JSON.
///
/// # Errors
///
/// Returns an error if the value is not `GeoJSON` or holds no polygon.
pub fn parse_geojson_value(value: geojson::JsonValue) -> Result<Ring, RingParseError> {
    ring_from_geojson(GeoJson::from_json_value(value)?)
}

fn ring_from_geojson(geojson: GeoJson) -> Result<Ring, RingParseError> {
    let geometry = match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry),
    };

    let Some(geometry) = geometry else {
        return Err(RingParseError::NotPolygon {
            kind: "empty feature".to_string(),
        });
    };

    let geo_geometry: geo::Geometry<f64> = geometry.try_into()?;
    let exterior = match geo_geometry {
        geo::Geometry::Polygon(polygon) => polygon.exterior().clone(),
        geo::Geometry::MultiPolygon(multi) => match multi.0.first() {
            Some(polygon) => polygon.exterior().clone(),
            None => {
                return Err(RingParseError::NotPolygon {
                    kind: "empty MultiPolygon".to_string(),
                });
            }
        },
        other => {
            return Err(RingParseError::NotPolygon {
                kind: geometry_kind(&other).to_string(),
            });
        }
    };

    Ok(Ring::new(exterior.coords().map(|c| Point::new(c.x, c.y))))
}

const fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "non-polygon geometry",
    }
}
