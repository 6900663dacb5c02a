//! Boundary decomposition: depth, width, front/rear cross-sections, and side
//! lengths of a parcel ring.
//!
//! Ring vertices are projected into the principal-axis frame. A cross-section
//! at a target coordinate collects the perpendicular coordinate of every
//! vertex inside a tolerance band around the target, plus every point where
//! an edge crosses the band's centre line or either of its limits. Cadastral
//! rings carry near-duplicate vertices and small jogs, so the band (rather
//! than an exact edge intersection) is what keeps the measurements stable.

use parcel_intel_geometry_models::{BoundaryConfig, BoundaryMetrics, Point, Ring};

use crate::frame::axis_frame;
use crate::polygon_ops::perimeter;

/// Measures `ring`, orienting front/rear by `reference` when supplied.
///
/// Without a reference the front is the minimum-depth extreme. Never fails:
/// degenerate rings produce [`BoundaryMetrics::unavailable`], and each field
/// is independently absent when it cannot be measured plausibly.
#[must_use]
pub fn decompose_boundary(
    ring: &Ring,
    reference: Option<Point>,
    config: &BoundaryConfig,
) -> BoundaryMetrics {
    let Some(frame) = axis_frame(ring, config) else {
        log::debug!(
            "Ring with {} distinct vertices is degenerate, no measurements",
            ring.distinct_count()
        );
        return BoundaryMetrics::unavailable();
    };

    // (depth, width) per vertex
    let projected: Vec<(f64, f64)> = ring.points().iter().map(|p| frame.project(*p)).collect();
    let swapped: Vec<(f64, f64)> = projected.iter().map(|&(d, w)| (w, d)).collect();

    let (depth_min, depth_max) = extent(projected.iter().map(|&(d, _)| d));
    let (width_min, width_max) = extent(projected.iter().map(|&(_, w)| w));
    let depth_range = depth_max - depth_min;
    let width_range = width_max - width_min;

    let ceiling = perimeter(ring);
    let accept = |v: f64| plausible_length(v, config.min_length_m, ceiling);

    let (front_at, rear_at) = match reference.filter(|p| p.is_finite()) {
        Some(reference) => {
            let (ref_depth, _) = frame.project(reference);
            if (ref_depth - depth_min).abs() <= (ref_depth - depth_max).abs() {
                (depth_min, depth_max)
            } else {
                (depth_max, depth_min)
            }
        }
        None => (depth_min, depth_max),
    };

    let depth_band = band_half_width(depth_range, config);
    let width_band = band_half_width(width_range, config);

    let front = section_span(&projected, front_at, depth_band).unwrap_or(width_range);
    let rear = section_span(&projected, rear_at, depth_band).unwrap_or(width_range);
    let left = section_span(&swapped, width_min, width_band).unwrap_or(depth_range);
    let right = section_span(&swapped, width_max, width_band).unwrap_or(depth_range);

    BoundaryMetrics {
        depth: accept(depth_range),
        width: accept(width_range),
        front: accept(front),
        rear: accept(rear),
        left: accept(left),
        right: accept(right),
    }
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn band_half_width(range: f64, config: &BoundaryConfig) -> f64 {
    config.band_floor_m.max(config.band_fraction * range)
}

/// Rejects non-finite, near-zero, and longer-than-perimeter lengths.
fn plausible_length(value: f64, floor: f64, ceiling: f64) -> Option<f64> {
    (value.is_finite() && value >= floor && value > 0.0 && value <= ceiling).then_some(value)
}

/// Span of the cross-section through `target` along the first coordinate of
/// each `(along, across)` sample; `None` with fewer than two hits.
fn section_span(samples: &[(f64, f64)], target: f64, half_width: f64) -> Option<f64> {
    let mut hits: Vec<f64> = samples
        .iter()
        .filter(|(along, _)| (along - target).abs() <= half_width)
        .map(|&(_, across)| across)
        .collect();

    let levels = [target - half_width, target, target + half_width];
    let n = samples.len();
    for i in 0..n {
        let (a_along, a_across) = samples[i];
        let (b_along, b_across) = samples[(i + 1) % n];
        for level in levels {
            if (a_along - level) * (b_along - level) < 0.0 {
                let t = (level - a_along) / (b_along - a_along);
                hits.push(t.mul_add(b_across - a_across, a_across));
            }
        }
    }

    if hits.len() < 2 {
        return None;
    }
    let (lo, hi) = extent(hits.into_iter());
    Some(hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn transform(points: &[(f64, f64)], angle_deg: f64, shift: usize) -> Ring {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let mut pts: Vec<Point> = points
            .iter()
            .map(|&(x, y)| Point::new(x * c - y * s + 334_000.0, x * s + y * c + 6_250_000.0))
            .collect();
        let n = pts.len();
        pts.rotate_left(shift % n);
        Ring::new(pts)
    }

    fn rotate_point(x: f64, y: f64, angle_deg: f64) -> Point {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Point::new(x * c - y * s + 334_000.0, x * s + y * c + 6_250_000.0)
    }

    fn close(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < TOL)
    }

    const RECT_20_BY_40: [(f64, f64); 4] = [(0.0, 0.0), (20.0, 0.0), (20.0, 40.0), (0.0, 40.0)];

    #[test]
    fn rectangle_with_reference_near_short_edge() {
        let ring = transform(&RECT_20_BY_40, 0.0, 0);
        let reference = rotate_point(10.0, -3.0, 0.0);
        let m = decompose_boundary(&ring, Some(reference), &BoundaryConfig::default());

        assert!(close(m.depth, 40.0), "depth {:?}", m.depth);
        assert!(close(m.width, 20.0), "width {:?}", m.width);
        assert!(close(m.front, 20.0), "front {:?}", m.front);
        assert!(close(m.rear, 20.0), "rear {:?}", m.rear);
        assert!(close(m.left, 40.0), "left {:?}", m.left);
        assert!(close(m.right, 40.0), "right {:?}", m.right);
    }

    #[test]
    fn rectangle_is_rotation_and_start_invariant() {
        for angle in [0.0, 17.0, 45.0, 90.0, 133.0, 271.5] {
            for shift in 0..4 {
                let ring = transform(&RECT_20_BY_40, angle, shift);
                let m = decompose_boundary(&ring, None, &BoundaryConfig::default());
                assert!(close(m.depth, 40.0), "angle {angle} shift {shift}: {m:?}");
                assert!(close(m.width, 20.0), "angle {angle} shift {shift}: {m:?}");
                assert!(close(m.front, 20.0), "angle {angle} shift {shift}: {m:?}");
                assert!(close(m.rear, 20.0), "angle {angle} shift {shift}: {m:?}");
                assert!(close(m.left, 40.0), "angle {angle} shift {shift}: {m:?}");
                assert!(close(m.right, 40.0), "angle {angle} shift {shift}: {m:?}");
            }
        }
    }

    #[test]
    fn rotated_square_measures_its_sides() {
        let square = [(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)];
        let m = decompose_boundary(&transform(&square, 45.0, 1), None, &BoundaryConfig::default());
        for v in [m.depth, m.width, m.front, m.rear, m.left, m.right] {
            assert!(close(v, 30.0), "{m:?}");
        }
    }

    #[test]
    fn closed_and_open_rings_agree() {
        let mut closed: Vec<Point> = RECT_20_BY_40.iter().map(|&(x, y)| Point::new(x, y)).collect();
        closed.push(closed[0]);
        let open = Ring::new(RECT_20_BY_40.iter().map(|&(x, y)| Point::new(x, y)));
        let config = BoundaryConfig::default();
        assert_eq!(
            decompose_boundary(&Ring::new(closed), None, &config),
            decompose_boundary(&open, None, &config)
        );
    }

    #[test]
    fn reference_selects_front_of_trapezoid() {
        // 10 m wide at y = 0, 30 m wide at y = 50
        let trapezoid = [(10.0, 0.0), (20.0, 0.0), (30.0, 50.0), (0.0, 50.0)];
        let config = BoundaryConfig::default();

        let near_narrow = rotate_point(15.0, -5.0, 20.0);
        let m = decompose_boundary(&transform(&trapezoid, 20.0, 0), Some(near_narrow), &config);
        let (front, rear) = (m.front.unwrap(), m.rear.unwrap());
        assert!(front < rear, "{m:?}");
        assert!((10.0..12.0).contains(&front), "{m:?}");
        assert!((28.0..=30.0 + TOL).contains(&rear), "{m:?}");

        let near_wide = rotate_point(15.0, 60.0, 20.0);
        let flipped = decompose_boundary(&transform(&trapezoid, 20.0, 0), Some(near_wide), &config);
        assert!((flipped.front.unwrap() - rear).abs() < TOL);
        assert!((flipped.rear.unwrap() - front).abs() < TOL);
    }

    #[test]
    fn battle_axe_handle_is_the_front() {
        // 4 m handle, 20 m long, opening onto a 20 x 30 body.
        let battle_axe = [
            (8.0, 0.0),
            (12.0, 0.0),
            (12.0, 20.0),
            (20.0, 20.0),
            (20.0, 50.0),
            (0.0, 50.0),
            (0.0, 20.0),
            (8.0, 20.0),
        ];
        let m = decompose_boundary(
            &transform(&battle_axe, 0.0, 0),
            Some(rotate_point(10.0, -2.0, 0.0)),
            &BoundaryConfig::default(),
        );
        assert!(close(m.front, 4.0), "{m:?}");
        assert!(close(m.rear, 20.0), "{m:?}");
        assert!(close(m.depth, 50.0), "{m:?}");
    }

    fn sorted_sides(m: &BoundaryMetrics) -> Vec<f64> {
        let mut sides: Vec<f64> = [m.front, m.rear, m.left, m.right]
            .into_iter()
            .map(|v| v.expect("side should be measurable"))
            .collect();
        sides.sort_by(f64::total_cmp);
        sides
    }

    #[test]
    fn irregular_shapes_are_rotation_and_start_invariant() {
        let shapes: [&[(f64, f64)]; 3] = [
            &[
                (8.0, 0.0),
                (12.0, 0.0),
                (12.0, 20.0),
                (20.0, 20.0),
                (20.0, 50.0),
                (0.0, 50.0),
                (0.0, 20.0),
                (8.0, 20.0),
            ],
            &[(10.0, 0.0), (20.0, 0.0), (30.0, 50.0), (0.0, 50.0)],
            &[(0.0, 0.0), (18.0, 2.0), (22.0, 25.0), (9.0, 36.0), (-3.0, 21.0)],
        ];
        let config = BoundaryConfig::default();

        for shape in shapes {
            let baseline = decompose_boundary(&transform(shape, 0.0, 0), None, &config);
            let expected = sorted_sides(&baseline);

            for angle in [11.0, 45.0, 97.5, 180.0, 303.0] {
                for shift in 0..shape.len() {
                    let m = decompose_boundary(&transform(shape, angle, shift), None, &config);
                    let context = format!("{shape:?} angle {angle} shift {shift}: {m:?}");
                    assert!(close(m.depth, baseline.depth.unwrap()), "{context}");
                    assert!(close(m.width, baseline.width.unwrap()), "{context}");
                    for (got, want) in sorted_sides(&m).iter().zip(&expected) {
                        assert!((got - want).abs() < TOL, "{context}");
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_rings_are_unavailable() {
        let config = BoundaryConfig::default();
        let cases = [
            Ring::new(vec![]),
            Ring::new(vec![Point::new(1.0, 1.0)]),
            Ring::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(0.0, 0.0)]),
            Ring::new(vec![Point::new(f64::NAN, 0.0), Point::new(0.0, 0.0), Point::new(3.0, 0.0)]),
        ];
        for ring in &cases {
            assert!(decompose_boundary(ring, None, &config).is_unavailable(), "{ring:?}");
        }
    }

    #[test]
    fn sliver_width_is_unavailable_not_zero() {
        let sliver = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(100.0, 0.001),
        ]);
        let m = decompose_boundary(&sliver, None, &BoundaryConfig::default());
        assert!(m.depth.is_some());
        assert_eq!(m.width, None);
        assert_eq!(m.front, None);
        assert_eq!(m.rear, None);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let ring = transform(&[(0.0, 0.0), (13.0, 2.0), (17.0, 31.0), (-2.0, 28.0)], 33.0, 2);
        let reference = Some(Point::new(334_005.0, 6_249_990.0));
        let config = BoundaryConfig::default();
        assert_eq!(
            decompose_boundary(&ring, reference, &config),
            decompose_boundary(&ring, reference, &config)
        );
    }

    #[test]
    fn section_span_needs_two_hits() {
        let samples = [(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)];
        assert_eq!(section_span(&samples, -100.0, 0.5), None);
    }
}
