//! Polygon boolean operations over `i_overlay`.
//!
//! Every result is normalized: degenerate contours are dropped, outer
//! contours wind counter-clockwise, holes clockwise, and each contour starts
//! at its lowest-then-leftmost vertex. Downstream code that takes the
//! "first" vertex or contour therefore behaves the same across runs.
//!
//! # Precision
//!
//! Fixed-point input goes through the `i_overlay` float adapter, which centres
//! the bounding box and scales it by a power of two onto a 32-bit grid. While
//! the combined extent of all operands stays below [`EXACT_EXTENT`] units
//! that scale is at least 2, so every input vertex lands on the grid exactly
//! and only newly created intersection points are rounded (to the nearest
//! unit). Larger extents snap input vertices to a grid of
//! `extent / EXACT_EXTENT` units; a warning is logged when that happens.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use i_overlay::mesh::outline::offset::OutlineOffset;
use i_overlay::mesh::style::{LineJoin, OutlineStyle};
use polynest_core::geometry::{bottom_left_index, bounds, signed_area2, IntPoint, Ngon, Ngons};

/// Minimum miter angle passed to the offset engine, in radians.
const MITER_MIN_ANGLE: f64 = 0.1;

/// Operand extent, in fixed-point units, below which input vertices survive
/// the float adapter unchanged.
pub const EXACT_EXTENT: i64 = 1 << 30;

/// Whether the combined extent of `sets` is too large for exact round trips.
fn exceeds_exact_extent(sets: &[&[Ngon]]) -> bool {
    bounds(sets.iter().flat_map(|set| set.iter().flatten()))
        .map_or(false, |b| b.width().max(b.height()) >= EXACT_EXTENT)
}

fn warn_if_inexact(op: &str, sets: &[&[Ngon]]) {
    if exceeds_exact_extent(sets) {
        log::warn!(
            "{} operands span {} units or more; vertices will be snapped",
            op,
            EXACT_EXTENT
        );
    }
}

type FloatContours = Vec<Vec<[f64; 2]>>;

fn to_float(polygons: &[Ngon]) -> FloatContours {
    polygons
        .iter()
        .filter(|p| p.len() >= 3)
        .map(|p| p.iter().map(|v| [v.x as f64, v.y as f64]).collect())
        .collect()
}

/// Converts overlay shapes (outer contour followed by holes) back to
/// fixed-point contours with normalized orientation.
fn from_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Ngons {
    let mut out = Ngons::new();
    for shape in shapes {
        for (k, contour) in shape.into_iter().enumerate() {
            let mut ngon: Ngon = Vec::with_capacity(contour.len());
            for [x, y] in contour {
                let p = IntPoint::from_f64(x, y);
                if ngon.last() != Some(&p) {
                    ngon.push(p);
                }
            }
            while ngon.len() > 1 && ngon.first() == ngon.last() {
                ngon.pop();
            }
            let area2 = signed_area2(&ngon);
            if ngon.len() < 3 || area2 == 0 {
                continue;
            }
            let is_outer = k == 0;
            if (area2 > 0) != is_outer {
                ngon.reverse();
            }
            out.push(rotate_to_bottom_left(ngon));
        }
    }
    out
}

fn rotate_to_bottom_left(mut ngon: Ngon) -> Ngon {
    let start = bottom_left_index(&ngon);
    ngon.rotate_left(start);
    ngon
}

fn overlay(subject: &[Ngon], clip: &[Ngon], rule: OverlayRule) -> Ngons {
    let subj = to_float(subject);
    let clip_f = to_float(clip);
    if subj.is_empty() && clip_f.is_empty() {
        return Ngons::new();
    }
    warn_if_inexact("boolean", &[subject, clip]);
    from_shapes(subj.overlay(&clip_f, rule, FillRule::NonZero))
}

/// Union of two polygon sets under the non-zero fill rule.
pub fn union(subject: &[Ngon], clip: &[Ngon]) -> Ngons {
    overlay(subject, clip, OverlayRule::Union)
}

/// `subject` minus `clip` under the non-zero fill rule.
pub fn difference(subject: &[Ngon], clip: &[Ngon]) -> Ngons {
    if subject.is_empty() {
        return Ngons::new();
    }
    overlay(subject, clip, OverlayRule::Difference)
}

/// Intersection of two polygon sets under the non-zero fill rule.
pub fn intersection(subject: &[Ngon], clip: &[Ngon]) -> Ngons {
    if subject.is_empty() || clip.is_empty() {
        return Ngons::new();
    }
    overlay(subject, clip, OverlayRule::Intersect)
}

/// Resolves overlaps and self-intersections of a polygon set.
pub fn simplify(polygons: &[Ngon]) -> Ngons {
    overlay(polygons, &[], OverlayRule::Union)
}

/// Running union of a sequence of polygon sets.
pub fn union_all<I>(sets: I) -> Ngons
where
    I: IntoIterator<Item = Ngons>,
{
    sets.into_iter()
        .fold(Ngons::new(), |acc, set| union(&acc, &set))
}

/// Inflates a polygon set by `delta` fixed-point units with mitered corners.
pub fn offset_miter(polygons: &[Ngon], delta: f64) -> Ngons {
    let shapes = group_shapes(polygons);
    if shapes.is_empty() {
        return Ngons::new();
    }
    warn_if_inexact("offset", &[polygons]);
    let style = OutlineStyle::new(delta).line_join(LineJoin::Miter(MITER_MIN_ANGLE));
    from_shapes(shapes.outline(style))
}

/// Groups normalized contours into outline shapes: each outer contour
/// followed by the holes it contains.
///
/// The outline engine grows clockwise outers and counter-clockwise holes, the
/// reverse of our convention, so every contour is flipped on the way in.
fn group_shapes(polygons: &[Ngon]) -> Vec<FloatContours> {
    let mut shapes: Vec<(&Ngon, FloatContours)> = Vec::new();
    for p in polygons.iter().filter(|p| signed_area2(p) > 0) {
        shapes.push((p, vec![to_float_reversed(p)]));
    }
    for hole in polygons.iter().filter(|p| signed_area2(p) < 0) {
        if let Some((_, contours)) = shapes
            .iter_mut()
            .find(|(outer, _)| contains_point(outer, hole[0]))
        {
            contours.push(to_float_reversed(hole));
        }
    }
    shapes.into_iter().map(|(_, c)| c).collect()
}

fn to_float_reversed(contour: &[IntPoint]) -> Vec<[f64; 2]> {
    contour
        .iter()
        .rev()
        .map(|v| [v.x as f64, v.y as f64])
        .collect()
}

/// Even-odd point-in-polygon test; boundary points count as inside.
pub fn contains_point(polygon: &[IntPoint], p: IntPoint) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (b - a).cross(p - a) == 0
            && p.x >= a.x.min(b.x)
            && p.x <= a.x.max(b.x)
            && p.y >= a.y.min(b.y)
            && p.y <= a.y.max(b.y)
        {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let lhs = (p.x - a.x) as i128 * (b.y - a.y) as i128;
            let rhs = (b.x - a.x) as i128 * (p.y - a.y) as i128;
            let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
    }
    inside
}

/// The outer contour with the largest area, if any.
pub fn largest_outer(polygons: &[Ngon]) -> Option<Ngon> {
    polygons
        .iter()
        .filter(|p| signed_area2(p) > 0)
        .max_by_key(|p| signed_area2(p))
        .cloned()
}
