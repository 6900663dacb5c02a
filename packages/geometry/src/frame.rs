//! Principal-axis frame for a parcel ring.
//!
//! The 2×2 vertex covariance matrix is diagonalized in closed form: the
//! direction of greatest variance is `θ = ½·atan2(2·sxy, sxx − syy)`.

use std::f64::consts::FRAC_PI_2;

use parcel_intel_geometry_models::{AxisFrame, BoundaryConfig, FrameKind, Point, Ring};

/// Derives the (depth, width) frame for `ring`.
///
/// Returns `None` for degenerate rings. When the covariance is isotropic
/// (a square, a regular polygon) the principal direction is undefined and
/// the frame follows the ring's longest edge instead; when the covariance
/// vanishes altogether the frame is axis-aligned.
#[must_use]
pub fn axis_frame(ring: &Ring, config: &BoundaryConfig) -> Option<AxisFrame> {
    if ring.is_degenerate() {
        return None;
    }
    let centroid = ring.vertex_mean()?;

    let (mut sxx, mut syy, mut sxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for p in ring.points() {
        let d = p.minus(centroid);
        sxx = d.x.mul_add(d.x, sxx);
        syy = d.y.mul_add(d.y, syy);
        sxy = d.x.mul_add(d.y, sxy);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = ring.len() as f64;
    sxx /= n;
    syy /= n;
    sxy /= n;

    let total = sxx + syy;
    let eps = config.covariance_epsilon;

    if !total.is_finite() || total <= eps {
        return Some(frame_from(centroid, Point::new(1.0, 0.0), FrameKind::AxisAligned));
    }

    // Half the eigenvalue gap; zero means every direction has equal variance.
    let half_gap = (0.5 * (sxx - syy)).hypot(sxy);
    if half_gap <= eps * total {
        let primary = longest_edge_direction(ring).unwrap_or(Point::new(1.0, 0.0));
        return Some(frame_from(centroid, primary, FrameKind::LongestEdge));
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    Some(frame_from(
        centroid,
        Point::new(theta.cos(), theta.sin()),
        FrameKind::Principal,
    ))
}

fn frame_from(centroid: Point, primary: Point, kind: FrameKind) -> AxisFrame {
    AxisFrame {
        centroid,
        primary,
        secondary: Point::new(-primary.y, primary.x),
        kind,
    }
}

/// Unit vector along the longest edge, folded into `[0°, 90°)`.
///
/// Edges within a relative `1e-9` of the longest count as tied; the one
/// with the smallest folded angle wins so the choice does not depend on
/// where the ring starts.
fn longest_edge_direction(ring: &Ring) -> Option<Point> {
    let longest = ring
        .edges()
        .map(|(a, b)| a.distance(b))
        .fold(0.0_f64, f64::max);
    if longest <= 0.0 || !longest.is_finite() {
        return None;
    }

    let angle = ring
        .edges()
        .filter(|(a, b)| a.distance(*b) >= longest * (1.0 - 1e-9))
        .map(|(a, b)| (b.y - a.y).atan2(b.x - a.x).rem_euclid(FRAC_PI_2))
        .fold(f64::INFINITY, f64::min);

    // atan2 noise can land a hair under π/2
    let angle = if FRAC_PI_2 - angle < 1e-12 { 0.0 } else { angle };
    Some(Point::new(angle.cos(), angle.sin()))
}
