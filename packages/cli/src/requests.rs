//! JSON request and response shapes for each subcommand, plus the code that
//! runs the engines over them.

use std::collections::BTreeMap;

use parcel_intel_config::EngineConfig;
use parcel_intel_geometry::{describe_parcel, is_corner_lot, parse_geojson_value};
use parcel_intel_geometry_models::{LotSubtype, ParcelGeometry, Point, Ring};
use parcel_intel_reconcile::Reconciler;
use parcel_intel_reconcile_models::{Candidate, Resolution};
use parcel_intel_spatial::ProximityIndex;
use parcel_intel_spatial_models::{LocatedFeature, ProximityResult};
use serde::{Deserialize, Serialize};

/// A parcel outline plus the context needed to orient and label it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryRequest {
    /// Outline as `[[x, y], ...]` in projected metres.
    #[serde(default)]
    pub ring: Option<Ring>,
    /// Outline as a `GeoJSON` polygon, feature, or feature collection.
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
    /// Point on the street side, usually the geocoded address.
    #[serde(default)]
    pub reference: Option<Point>,
    /// Cadastral lot-type code, if the dataset has one.
    #[serde(default)]
    pub subtype: Option<LotSubtype>,
    /// Road reserve polygons touching the block, for corner-lot detection.
    #[serde(default)]
    pub roads: Vec<Ring>,
}

impl BoundaryRequest {
    fn outline(&self) -> Result<Ring, Box<dyn std::error::Error>> {
        match (&self.ring, &self.geojson) {
            (Some(ring), _) => Ok(ring.clone()),
            (None, Some(geojson)) => Ok(parse_geojson_value(geojson.clone())?),
            (None, None) => Err("parcel needs either `ring` or `geojson`".into()),
        }
    }
}

/// Measurements and labels for one parcel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryReport {
    #[serde(flatten)]
    pub parcel: ParcelGeometry,
    /// Only present when road polygons were supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_lot: Option<bool>,
}

/// Competing values per attribute name.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub attributes: BTreeMap<String, Vec<Candidate>>,
}

/// A target point and the features to search.
#[derive(Debug, Clone, Deserialize)]
pub struct NearestRequest {
    pub target: Point,
    pub features: Vec<LocatedFeature>,
}

/// Everything known about one site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub parcel: BoundaryRequest,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<Candidate>>,
    #[serde(default)]
    pub features: Vec<LocatedFeature>,
    /// Proximity target; defaults to the parcel reference point, then to
    /// the mean of the outline's vertices.
    #[serde(default)]
    pub target: Option<Point>,
}

/// Combined output of every engine for one site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReport {
    pub parcel: BoundaryReport,
    pub attributes: BTreeMap<String, Resolution>,
    pub nearest: Option<ProximityResult>,
}

/// Decomposes and labels a parcel.
///
/// # Errors
///
/// * If the request has no outline
/// * If the `GeoJSON` outline is not a polygon
pub fn run_boundary(
    request: &BoundaryRequest,
    config: &EngineConfig,
) -> Result<BoundaryReport, Box<dyn std::error::Error>> {
    let ring = request.outline()?;
    let parcel = describe_parcel(
        &ring,
        request.reference,
        request.subtype.as_ref(),
        &config.boundary,
        &config.lot_rules,
    );
    if parcel.metrics.is_unavailable() {
        log::warn!("Parcel outline is degenerate; no measurements available");
    }

    let corner_lot = if request.roads.is_empty() {
        None
    } else {
        Some(is_corner_lot(&ring, &request.roads))
    };

    Ok(BoundaryReport { parcel, corner_lot })
}

/// Reconciles every attribute independently.
#[must_use]
pub fn run_resolve(
    attributes: &BTreeMap<String, Vec<Candidate>>,
    config: &EngineConfig,
) -> BTreeMap<String, Resolution> {
    let reconciler = Reconciler::new(config.reconcile);
    attributes
        .iter()
        .map(|(name, candidates)| {
            let resolution = reconciler.resolve(candidates);
            log::debug!("{name}: {} ({:?})", resolution.status, resolution.value);
            (name.clone(), resolution)
        })
        .collect()
}

/// Finds the nearest feature without routed refinement.
#[must_use]
pub fn run_nearest(request: &NearestRequest, config: &EngineConfig) -> Option<ProximityResult> {
    ProximityIndex::new(&request.features, config.proximity).nearest(request.target)
}

/// Runs every engine over one site.
///
/// # Errors
///
/// * If the parcel outline cannot be read (see [`run_boundary`])
pub fn run_report(
    request: &ReportRequest,
    config: &EngineConfig,
) -> Result<SiteReport, Box<dyn std::error::Error>> {
    let parcel = run_boundary(&request.parcel, config)?;
    let attributes = run_resolve(&request.attributes, config);

    let target = match request.target.or(request.parcel.reference) {
        Some(target) => Some(target),
        None => request.parcel.outline()?.vertex_mean(),
    };

    let nearest = match target {
        Some(target) if !request.features.is_empty() => {
            ProximityIndex::new(&request.features, config.proximity).nearest(target)
        }
        _ => None,
    };

    Ok(SiteReport {
        parcel,
        attributes,
        nearest,
    })
}
