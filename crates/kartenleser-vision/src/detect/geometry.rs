// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon and line helpers used by the detection stages. Pure functions, no
// state.
//
// Lines are carried in foot-point form: the point `p = (r cos t, r sin t)` of
// a Hough line closest to the origin. The line is then `x * p.x + y * p.y =
// |p|^2`, which keeps both the direction (the normal) and the offset in one
// vector and does not wrap the way `t` does.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::hough::PolarLine;
use imageproc::point::Point;
use imageproc::rect::Rect;
use kartenleser_core::error::{KartenleserError, Result};
use kartenleser_core::{CornerSet, Point2};

/// Signed shoelace area; positive for clockwise order in image coordinates
/// (y pointing down).
pub fn signed_area(points: &[Point2]) -> f32 {
    let n = points.len();
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Unsigned area enclosed by an integer contour.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

/// Inclusive bounding box of a point set, `None` when empty.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32))
}

/// Simplify a closed polygon (typically a convex hull) with Douglas-Peucker.
///
/// The closing duplicate is removed and vertices closer than `tolerance` to
/// their predecessor are merged, so a chamfered corner collapses to a single
/// vertex.
pub fn simplify_closed(polygon: &[Point<i32>], tolerance: f64) -> Vec<Point<i32>> {
    if polygon.len() < 3 || tolerance <= 0.0 {
        return polygon.to_vec();
    }
    let approx = approximate_polygon_dp(polygon, tolerance, true);

    let near = |a: &Point<i32>, b: &Point<i32>| {
        let (dx, dy) = ((a.x - b.x) as f64, (a.y - b.y) as f64);
        (dx * dx + dy * dy).sqrt() < tolerance
    };

    let mut merged: Vec<Point<i32>> = Vec::with_capacity(approx.len());
    for p in approx {
        if merged.last().is_some_and(|q| near(q, &p)) {
            continue;
        }
        merged.push(p);
    }
    while merged.len() > 1 && near(&merged[0], &merged[merged.len() - 1]) {
        merged.pop();
    }
    merged
}

/// Foot of the perpendicular from the origin onto a Hough line.
pub fn foot_point(line: &PolarLine) -> Point2 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    Point2::new(line.r * theta.cos(), line.r * theta.sin())
}

/// Angle of a line normal against the x axis folded into [0, 90] degrees.
/// Small values mean near-vertical lines, large values near-horizontal ones;
/// it is the angular form of `|y / x|` and stays defined when `x == 0`.
pub fn normal_tilt_deg(foot: Point2) -> f32 {
    foot.y.abs().atan2(foot.x.abs()).to_degrees()
}

/// Angle between two lines in [0, 90] degrees.
pub fn angle_between_deg(a: Point2, b: Point2) -> f32 {
    let diff = (a.y.atan2(a.x) - b.y.atan2(b.x)).to_degrees().abs() % 180.0;
    diff.min(180.0 - diff)
}

/// Intersection of two lines in foot-point form. `None` when the lines are
/// parallel or either foot point sits on the origin.
pub fn intersect_foot_lines(a: Point2, b: Point2) -> Option<Point2> {
    let ra = a.x * a.x + a.y * a.y;
    let rb = b.x * b.x + b.y * b.y;
    let det = a.x * b.y - a.y * b.x;
    if ra == 0.0 || rb == 0.0 || det.abs() <= f32::EPSILON * ra.sqrt() * rb.sqrt() {
        return None;
    }
    let x = (ra * b.y - rb * a.y) / det;
    let y = (a.x * rb - b.x * ra) / det;
    (x.is_finite() && y.is_finite()).then_some(Point2::new(x, y))
}

/// Total least squares line through `points`, in foot-point form. `None`
/// for fewer than two distinct points or a line through the origin.
pub fn fit_foot_line(points: &[Point2]) -> Option<Point2> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (mx, my) = (sx / n, sy / n);

    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let (dx, dy) = (p.x as f64 - mx, p.y as f64 - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx + syy == 0.0 {
        return None;
    }

    // Principal axis of the scatter; the normal is perpendicular to it.
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (nx, ny) = (-theta.sin(), theta.cos());
    let r = mx * nx + my * ny;
    if r.abs() < 0.5 {
        return None;
    }
    Some(Point2::new((nx * r) as f32, (ny * r) as f32))
}

/// Check that the corners form a convex, non-degenerate quadrilateral with at
/// least `min_area` square pixels.
pub fn check_quad(corners: &CornerSet, min_area: f32) -> Result<()> {
    let outline = corners.outline();
    if outline.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(KartenleserError::DegenerateQuad(
            "corner coordinates are not finite".into(),
        ));
    }

    let mut sign = 0.0f32;
    for i in 0..4 {
        let (p0, p1, p2) = (outline[i], outline[(i + 1) % 4], outline[(i + 2) % 4]);
        let (e1x, e1y) = (p1.x - p0.x, p1.y - p0.y);
        let (e2x, e2y) = (p2.x - p1.x, p2.y - p1.y);
        let cross = e1x * e2y - e1y * e2x;
        let scale = (e1x.hypot(e1y) * e2x.hypot(e2y)).max(f32::MIN_POSITIVE);
        // sin of the turning angle; near zero means three collinear corners.
        if (cross / scale).abs() < 1e-3 {
            return Err(KartenleserError::DegenerateQuad(format!(
                "corners {i}..{} are collinear",
                i + 2
            )));
        }
        if sign != 0.0 && cross.signum() != sign {
            return Err(KartenleserError::DegenerateQuad(
                "quadrilateral is not convex".into(),
            ));
        }
        sign = cross.signum();
    }

    let area = signed_area(&outline).abs();
    if area < min_area {
        return Err(KartenleserError::DegenerateQuad(format!(
            "area {area:.0} px^2 is below {min_area:.0}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn corners(tl: (f32, f32), bl: (f32, f32), tr: (f32, f32), br: (f32, f32)) -> CornerSet {
        CornerSet {
            top_left: tl.into(),
            bottom_left: bl.into(),
            top_right: tr.into(),
            bottom_right: br.into(),
        }
    }

    #[test]
    fn shoelace_area_rectangle() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 5.0),
            Point2::new(0.0, 5.0),
        ];
        assert_abs_diff_eq!(signed_area(&pts).abs(), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn perpendicular_lines_intersect_at_corner() {
        // x = 50 and y = 100.
        let vertical = Point2::new(50.0, 0.0);
        let horizontal = Point2::new(0.0, 100.0);
        let p = intersect_foot_lines(vertical, horizontal).expect("should intersect");
        assert_abs_diff_eq!(p.x, 50.0, epsilon = 1e-3);
        assert_abs_diff_eq!(p.y, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        assert!(intersect_foot_lines(Point2::new(50.0, 0.0), Point2::new(120.0, 0.0)).is_none());
        assert!(intersect_foot_lines(Point2::new(0.0, 0.0), Point2::new(0.0, 10.0)).is_none());
    }

    #[test]
    fn foot_point_follows_hough_convention() {
        let vertical = PolarLine {
            r: 50.0,
            angle_in_degrees: 0,
        };
        let horizontal = PolarLine {
            r: 80.0,
            angle_in_degrees: 90,
        };
        let v = foot_point(&vertical);
        let h = foot_point(&horizontal);
        assert_abs_diff_eq!(v.x, 50.0, epsilon = 1e-3);
        assert_abs_diff_eq!(h.y, 80.0, epsilon = 1e-3);
        assert!(normal_tilt_deg(v) < 1.0);
        assert!(normal_tilt_deg(h) > 89.0);
        assert_abs_diff_eq!(angle_between_deg(v, h), 90.0, epsilon = 1e-3);
    }

    #[test]
    fn angle_between_wraps_half_turn() {
        // Normals 10 and 190 degrees describe parallel lines.
        let a = Point2::new(10f32.to_radians().cos(), 10f32.to_radians().sin());
        let b = Point2::new(-a.x * 3.0, -a.y * 3.0);
        assert!(angle_between_deg(a, b) < 1e-3);
    }

    #[test]
    fn line_fit_recovers_foot_points() {
        let vertical: Vec<Point2> = (50..390).map(|y| Point2::new(50.0, y as f32)).collect();
        let foot = fit_foot_line(&vertical).expect("fit");
        assert_abs_diff_eq!(foot.x, 50.0, epsilon = 1e-3);
        assert_abs_diff_eq!(foot.y, 0.0, epsilon = 1e-3);

        // x cos 30 + y sin 30 = 100.
        let (s, c) = 30f32.to_radians().sin_cos();
        let slanted: Vec<Point2> = (-50..=50)
            .map(|t| Point2::new(100.0 * c - t as f32 * s, 100.0 * s + t as f32 * c))
            .collect();
        let foot = fit_foot_line(&slanted).expect("fit");
        assert_abs_diff_eq!(foot.x, 100.0 * c, epsilon = 1e-2);
        assert_abs_diff_eq!(foot.y, 100.0 * s, epsilon = 1e-2);
    }

    #[test]
    fn line_fit_rejects_degenerate_input() {
        assert!(fit_foot_line(&[Point2::new(4.0, 4.0)]).is_none());
        assert!(fit_foot_line(&[Point2::new(4.0, 4.0); 3]).is_none());
        let diagonal: Vec<Point2> = (-5..5).map(|t| Point2::new(t as f32, t as f32)).collect();
        assert!(fit_foot_line(&diagonal).is_none());
    }

    #[test]
    fn convex_quad_is_accepted() {
        let quad = corners((10.0, 10.0), (15.0, 200.0), (300.0, 20.0), (290.0, 210.0));
        check_quad(&quad, 1000.0).expect("valid quad");
    }

    #[test]
    fn collinear_and_concave_quads_are_rejected() {
        let collinear = corners((0.0, 0.0), (0.0, 100.0), (100.0, 0.0), (50.0, 50.0));
        assert!(matches!(
            check_quad(&collinear, 0.0),
            Err(KartenleserError::DegenerateQuad(_))
        ));

        let concave = corners((0.0, 0.0), (0.0, 100.0), (100.0, 0.0), (30.0, 30.0));
        assert!(check_quad(&concave, 0.0).is_err());

        let tiny = corners((0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0));
        assert!(check_quad(&tiny, 1000.0).is_err());
    }

    #[test]
    fn chamfered_rectangle_simplifies_to_four_corners() {
        let hull = vec![
            Point::new(52, 50),
            Point::new(588, 50),
            Point::new(590, 52),
            Point::new(590, 388),
            Point::new(588, 390),
            Point::new(52, 390),
            Point::new(50, 388),
            Point::new(50, 52),
        ];
        let poly = simplify_closed(&hull, 20.0);
        assert_eq!(poly.len(), 4, "{poly:?}");
        for target in [(50, 50), (590, 50), (590, 390), (50, 390)] {
            assert!(
                poly.iter()
                    .any(|p| (p.x - target.0).abs() <= 3 && (p.y - target.1).abs() <= 3),
                "missing corner {target:?} in {poly:?}"
            );
        }
    }

    #[test]
    fn bounding_rect_is_inclusive() {
        let pts = [Point::new(3, 4), Point::new(7, 4), Point::new(5, 9)];
        let rect = bounding_rect(&pts).expect("non-empty");
        assert_eq!((rect.left(), rect.top(), rect.width(), rect.height()), (3, 4, 5, 6));
        assert!(bounding_rect(&[]).is_none());
    }
}
