//! Fixed-point polygon data model.
//!
//! Polygon coordinates are stored as scaled integers so that boolean clipping
//! and Minkowski merging work on exact arithmetic. Floating point only appears
//! in transforms, scoring and at the UV boundary.

use crate::transform::IntRect;
use std::ops::{Add, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point with integer (fixed-point scaled) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntPoint {
    /// X coordinate.
    pub x: i64,
    /// Y coordinate.
    pub y: i64,
}

impl IntPoint {
    /// Creates a new point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Creates a point by rounding floating point coordinates.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i64,
            y: y.round() as i64,
        }
    }

    /// Returns the coordinates as floats.
    pub fn to_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Cross product `self × other` in 128-bit precision.
    pub fn cross(self, other: Self) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Dot product in 128-bit precision.
    pub fn dot(self, other: Self) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }
}

impl Add for IntPoint {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for IntPoint {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for IntPoint {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(i64, i64)> for IntPoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// A simple polygon; implicitly closed, winding direction significant.
pub type Ngon = Vec<IntPoint>;

/// A set of polygons forming one shape. Outer boundaries wind
/// counter-clockwise, holes clockwise.
pub type Ngons = Vec<Ngon>;

/// Twice the signed area of a polygon (positive for counter-clockwise).
pub fn signed_area2(polygon: &[IntPoint]) -> i128 {
    let n = polygon.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| polygon[i].cross(polygon[(i + 1) % n]))
        .sum()
}

/// Signed area of a polygon (positive for counter-clockwise).
pub fn signed_area(polygon: &[IntPoint]) -> f64 {
    signed_area2(polygon) as f64 * 0.5
}

/// Unsigned area of a polygon.
pub fn area(polygon: &[IntPoint]) -> f64 {
    signed_area(polygon).abs()
}

/// Net signed area of a polygon set (holes subtract).
pub fn set_signed_area(polygons: &[Ngon]) -> f64 {
    polygons.iter().map(|p| signed_area(p)).sum()
}

/// Returns a copy of `polygon`, optionally negated, then shifted by `shift`.
pub fn clone_shifted(polygon: &[IntPoint], shift: IntPoint, flip: bool) -> Ngon {
    let s = if flip { -1 } else { 1 };
    polygon
        .iter()
        .map(|p| IntPoint::new(s * p.x + shift.x, s * p.y + shift.y))
        .collect()
}

/// Applies [`clone_shifted`] to every polygon of a set.
pub fn clone_set_shifted(polygons: &[Ngon], shift: IntPoint, flip: bool) -> Ngons {
    polygons
        .iter()
        .map(|p| clone_shifted(p, shift, flip))
        .collect()
}

/// Bounding box of a point sequence, `None` when empty.
pub fn bounds<'a, I>(points: I) -> Option<IntRect>
where
    I: IntoIterator<Item = &'a IntPoint>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut rect = IntRect::new(first.x, first.y, first.x, first.y);
    for p in iter {
        rect.min_x = rect.min_x.min(p.x);
        rect.min_y = rect.min_y.min(p.y);
        rect.max_x = rect.max_x.max(p.x);
        rect.max_y = rect.max_y.max(p.y);
    }
    Some(rect)
}

/// Bounding box of every vertex of a polygon set.
pub fn set_bounds(polygons: &[Ngon]) -> Option<IntRect> {
    bounds(polygons.iter().flatten())
}

/// Index of the lowest vertex, ties broken by the smallest x.
pub fn bottom_left_index(polygon: &[IntPoint]) -> usize {
    let mut min_idx = 0;
    for (i, p) in polygon.iter().enumerate() {
        let m = polygon[min_idx];
        if p.y < m.y || (p.y == m.y && p.x < m.x) {
            min_idx = i;
        }
    }
    min_idx
}
