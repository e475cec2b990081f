//! 2D geometry primitives used by clustering, NFP generation and nesting.

use crate::boolean;
use polynest_core::geometry::{bounds, signed_area, signed_area2, IntPoint, Ngon};
use polynest_core::{Affine2, Error, IntRect, Rect, Result};

/// Convex hull of a polygon with an optional relaxation.
///
/// Starting from the lowest vertex, passes over the outline drop every vertex
/// that does not turn left, until a pass removes nothing. With
/// `rigidness > 0` at most `round(10 - 10 * rigidness)` consecutive vertices
/// may be dropped before one is kept regardless, and the walk stops once
/// `area / hull_area < sqrt(rigidness)`. A rigidness of 1 or more returns the
/// input unchanged.
pub fn convex_hull(subject: &[IntPoint], rigidness: f64) -> Ngon {
    if subject.is_empty() {
        return Ngon::new();
    }
    if rigidness >= 1.0 {
        return subject.to_vec();
    }

    let mut hull: Ngon = subject.to_vec();
    if signed_area2(&hull) < 0 {
        hull.reverse();
    }
    let subj_area = signed_area(&hull);

    let mut last_vert = 0;
    for (i, p) in hull.iter().enumerate() {
        if p.y < hull[last_vert].y {
            last_vert = i;
        }
    }

    let max_steps = if rigidness <= 0.0 {
        usize::MAX
    } else {
        (10.0 - 10.0 * rigidness).round() as usize
    };

    let mut last_len = 0;
    while last_len != hull.len() {
        let last_hull = std::mem::take(&mut hull);
        last_len = last_hull.len();
        let n = last_len;
        let start = last_vert;
        hull.push(last_hull[start]);

        let mut steps_since_insert = 0;
        for i in 1..n {
            let a = last_hull[last_vert];
            let b = last_hull[(start + i) % n];
            let c = last_hull[(start + i + 1) % n];
            if (b - a).cross(c - a) > 0 || steps_since_insert >= max_steps {
                hull.push(b);
                last_vert = (start + i) % n;
                steps_since_insert = 0;
            } else {
                steps_since_insert += 1;
            }
        }
        last_vert = 0;

        let hull_area = signed_area(&hull);
        if subj_area / hull_area < rigidness.sqrt() {
            if let Some(simple) = boolean::largest_outer(&boolean::simplify(&[hull.clone()])) {
                hull = simple;
            }
            break;
        }
    }
    hull
}

/// Bounding box of floating point coordinates, `None` when empty.
pub fn float_bounds<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut iter = points.into_iter();
    let (x, y) = iter.next()?;
    let mut rect = Rect::new(x, y, x, y);
    for (x, y) in iter {
        rect.min_x = rect.min_x.min(x);
        rect.min_y = rect.min_y.min(y);
        rect.max_x = rect.max_x.max(x);
        rect.max_y = rect.max_y.max(y);
    }
    Some(rect)
}

/// Scale followed by translation mapping a bounding box onto a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefitTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub shift_x: f64,
    pub shift_y: f64,
}

impl RefitTransform {
    pub fn scale(&self) -> Affine2 {
        Affine2::scale(self.scale_x, self.scale_y)
    }

    pub fn translation(&self) -> Affine2 {
        Affine2::translation(self.shift_x, self.shift_y)
    }

    /// The combined transform, scale first.
    pub fn to_affine(&self) -> Affine2 {
        self.scale().then(&self.translation())
    }
}

/// Computes the transform mapping the bounds of `points` onto `target`.
///
/// Without `stretch` both axes use the smaller of the two scales, so the
/// result is anchored at the target's lower-left corner and preserves aspect.
pub fn refit_transform<I>(points: I, target: &Rect, stretch: bool) -> Result<RefitTransform>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let bds = float_bounds(points)
        .ok_or_else(|| Error::InvalidGeometry("refit of an empty point set".into()))?;
    if bds.width() <= 0.0 || bds.height() <= 0.0 {
        return Err(Error::InvalidGeometry(format!(
            "refit source has zero extent ({} x {})",
            bds.width(),
            bds.height()
        )));
    }

    let mut scale_x = target.width().abs() / bds.width();
    let mut scale_y = target.height().abs() / bds.height();
    if !stretch {
        let s = scale_x.min(scale_y);
        scale_x = s;
        scale_y = s;
    }

    Ok(RefitTransform {
        scale_x,
        scale_y,
        shift_x: -bds.min_x * scale_x + target.min_x.min(target.max_x),
        shift_y: -bds.min_y * scale_y + target.min_y.min(target.max_y),
    })
}

/// Rectangle of translations that keep `pattern` inside `canvas`, as a
/// counter-clockwise polygon. `None` when the pattern is larger than the canvas.
pub fn canvas_fit_polygon(canvas: &IntRect, pattern: &[IntPoint]) -> Option<Ngon> {
    let bds = bounds(pattern)?;
    let l = canvas.min_x - bds.min_x;
    let r = canvas.max_x - bds.max_x;
    let b = canvas.min_y - bds.min_y;
    let t = canvas.max_y - bds.max_y;
    if l > r || b > t {
        return None;
    }
    Some(IntRect::new(l, b, r, t).to_ngon())
}

/// Rotation that aligns the edge starting at `edge_start` with the +x axis.
pub fn align_to_edge_rotation(polygon: &[IntPoint], edge_start: usize) -> f64 {
    let n = polygon.len();
    if n == 0 {
        return 0.0;
    }
    let i = edge_start % n;
    let e = polygon[(i + 1) % n] - polygon[i];
    -(e.y as f64).atan2(e.x as f64)
}

/// True when the polygon covers all but `tolerance` of its bounding box.
pub fn is_almost_rectangle(polygon: &[IntPoint], tolerance: f64) -> bool {
    match bounds(polygon) {
        Some(bds) => 1.0 - signed_area(polygon).abs() / bds.area() < tolerance,
        None => false,
    }
}

/// Orientation of an outline with the smallest axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Index of the edge aligned with the x axis.
    pub edge: usize,
    /// Rotation aligning that edge.
    pub theta: f64,
    /// Bounding box area after rotation.
    pub area: f64,
    /// Whether the rotated box is wider than tall.
    pub landscape: bool,
}

impl Pose {
    /// Total rotation to apply, adding a quarter turn to stand landscape
    /// boxes upright.
    pub fn rotation(&self) -> f64 {
        if self.landscape {
            self.theta + std::f64::consts::FRAC_PI_2
        } else {
            self.theta
        }
    }
}

/// Tries every edge of `outline` as the bottom edge and keeps the first one
/// with the smallest bounding box.
pub fn best_pose(outline: &[IntPoint]) -> Option<Pose> {
    let mut best: Option<Pose> = None;
    for i in 0..outline.len() {
        let theta = align_to_edge_rotation(outline, i);
        let rotated = Affine2::rotation(theta).apply_ngon(outline);
        let Some(bds) = bounds(&rotated) else {
            continue;
        };
        let area = bds.area();
        if best.map_or(true, |b| area < b.area) {
            best = Some(Pose {
                edge: i,
                theta,
                area,
                landscape: bds.aspect() > 1.0,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, ConvexHull, LineString, Polygon};

    fn pt(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn star() -> Ngon {
        vec![
            pt(0, 0),
            pt(50, 30),
            pt(100, 0),
            pt(70, 50),
            pt(100, 100),
            pt(50, 70),
            pt(0, 100),
            pt(30, 50),
        ]
    }

    fn geo_hull_area(poly: &[IntPoint]) -> f64 {
        let ls: LineString<f64> = poly
            .iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect::<Vec<_>>()
            .into();
        Polygon::new(ls, vec![]).convex_hull().unsigned_area()
    }

    #[test]
    fn test_exact_hull_matches_oracle() {
        let s = star();
        let hull = convex_hull(&s, 0.0);
        assert!(signed_area2(&hull) > 0);
        assert!(hull.iter().all(|v| s.contains(v)));
        assert_eq!(hull.len(), 4);
        assert_relative_eq!(signed_area(&hull), geo_hull_area(&s));
        for v in &s {
            assert!(boolean::contains_point(&hull, *v));
        }
    }

    #[test]
    fn test_hull_of_clockwise_input() {
        let cw: Ngon = star().into_iter().rev().collect();
        let hull = convex_hull(&cw, 0.0);
        assert!(signed_area2(&hull) > 0);
        assert_relative_eq!(signed_area(&hull), 10_000.0);
    }

    #[test]
    fn test_rigid_hull_returns_input() {
        let s = star();
        assert_eq!(convex_hull(&s, 1.0), s);
        assert!(convex_hull(&[], 0.0).is_empty());
    }

    #[test]
    fn test_relaxed_hull_is_between() {
        let s = star();
        let hull = convex_hull(&s, 0.55);
        let a = signed_area(&hull);
        assert!(a >= signed_area(&s) - 1.0);
        assert!(a <= 10_000.0 + 1.0);
    }

    #[test]
    fn test_refit_stretch() {
        let pts = vec![(0.0, 0.0), (4.0, 1.0)];
        let target = Rect::new(10.0, 20.0, 12.0, 24.0);
        let t = refit_transform(pts, &target, true).unwrap().to_affine();
        let (x0, y0) = t.apply(0.0, 0.0);
        let (x1, y1) = t.apply(4.0, 1.0);
        assert_relative_eq!(x0, 10.0);
        assert_relative_eq!(y0, 20.0);
        assert_relative_eq!(x1, 12.0);
        assert_relative_eq!(y1, 24.0);
    }

    #[test]
    fn test_refit_uniform_keeps_aspect() {
        let pts = vec![(0.0, 0.0), (4.0, 1.0)];
        let target = Rect::new(0.0, 0.0, 2.0, 4.0);
        let r = refit_transform(pts, &target, false).unwrap();
        assert_relative_eq!(r.scale_x, 0.5);
        assert_relative_eq!(r.scale_y, 0.5);
    }

    #[test]
    fn test_refit_rejects_flat_input() {
        let pts = vec![(0.0, 1.0), (4.0, 1.0)];
        assert!(refit_transform(pts, &Rect::new(0.0, 0.0, 1.0, 1.0), true).is_err());
        assert!(refit_transform(Vec::new(), &Rect::new(0.0, 0.0, 1.0, 1.0), true).is_err());
    }

    #[test]
    fn test_canvas_fit_polygon() {
        let canvas = IntRect::new(0, 0, 100, 50);
        let pattern = vec![pt(0, 0), pt(30, 0), pt(30, 20), pt(0, 20)];
        let fit = canvas_fit_polygon(&canvas, &pattern).unwrap();
        assert_eq!(fit, vec![pt(0, 0), pt(70, 0), pt(70, 30), pt(0, 30)]);

        let too_big = vec![pt(0, 0), pt(130, 0), pt(130, 20), pt(0, 20)];
        assert!(canvas_fit_polygon(&canvas, &too_big).is_none());
    }

    #[test]
    fn test_align_to_edge_rotation() {
        let poly = vec![pt(0, 0), pt(10, 10), pt(0, 10)];
        assert_relative_eq!(align_to_edge_rotation(&poly, 0), -std::f64::consts::FRAC_PI_4);
        assert_relative_eq!(align_to_edge_rotation(&poly, 1), -std::f64::consts::PI);
    }

    #[test]
    fn test_almost_rectangle() {
        let square = vec![pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)];
        assert!(is_almost_rectangle(&square, 0.05));
        let tri = vec![pt(0, 0), pt(10, 0), pt(0, 10)];
        assert!(!is_almost_rectangle(&tri, 0.05));
    }

    #[test]
    fn test_best_pose_of_tilted_rectangle() {
        // 40x10 rectangle rotated 45 degrees
        let rect = vec![pt(0, 0), pt(40, 0), pt(40, 10), pt(0, 10)];
        let tilted = Affine2::rotation(std::f64::consts::FRAC_PI_4).apply_ngon(&rect);
        let pose = best_pose(&tilted).unwrap();
        assert!((pose.area - 400.0).abs() < 40.0, "area {}", pose.area);
        let upright = Affine2::rotation(pose.rotation()).apply_ngon(&tilted);
        assert!(bounds(&upright).unwrap().aspect() < 1.0);
    }
}
