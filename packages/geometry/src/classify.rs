//! Lot-shape classification from boundary measurements.

use parcel_intel_geometry_models::{BoundaryMetrics, LotLabel, LotRules, LotSubtype};

/// Labels a lot from its cadastral subtype and measured cross-sections.
///
/// A subtype with a fixed label wins outright. Otherwise the heuristics run
/// in order (restricted access, tapering, irregular sides), each skipped when
/// a measurement it needs is absent. If none fires, an unrecognised subtype
/// code is passed through, else the lot is [`LotLabel::Unclassified`].
#[must_use]
pub fn classify_lot(
    subtype: Option<&LotSubtype>,
    metrics: &BoundaryMetrics,
    rules: &LotRules,
) -> LotLabel {
    if let Some(label) = subtype.and_then(LotSubtype::fixed_label) {
        return label;
    }

    if let Some(label) = shape_heuristic(metrics, rules) {
        return label;
    }

    match subtype {
        Some(LotSubtype::Other(code)) if !code.is_empty() => LotLabel::Subtype(code.clone()),
        _ => LotLabel::Unclassified,
    }
}

fn shape_heuristic(metrics: &BoundaryMetrics, rules: &LotRules) -> Option<LotLabel> {
    if let (Some(front), Some(rear)) = (metrics.front, metrics.rear) {
        if front < rear * rules.restricted_front_ratio && front < rules.restricted_front_max_m {
            return Some(LotLabel::RestrictedAccess);
        }

        let taper = front / rear;
        if taper > rules.front_wider_ratio {
            return Some(LotLabel::FrontWiderTapered);
        }
        if taper < rules.rear_wider_ratio {
            return Some(LotLabel::RearWiderTapered);
        }
    }

    if let (Some(left), Some(right)) = (metrics.left, metrics.right) {
        if left.max(right) / left.min(right) > rules.irregular_side_ratio {
            return Some(LotLabel::Irregular);
        }
    }

    None
}
