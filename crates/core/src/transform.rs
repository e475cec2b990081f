//! Affine transforms and axis-aligned bounds.

use crate::geometry::{IntPoint, Ngon, Ngons};
use nalgebra::Matrix3;
use std::ops::Mul;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D affine transform stored as a 3×3 homogeneous matrix.
///
/// Transforms accumulate by left multiplication: applying `delta` to an
/// existing transform `t` yields `delta * t`, so the newest operation acts
/// last on a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    m: Matrix3<f64>,
}

impl Affine2 {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Wraps a raw homogeneous matrix.
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Axis scale about the origin.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            m: Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Counter-clockwise rotation about the origin, in radians.
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            m: Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Pure translation.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            m: Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0),
        }
    }

    /// Returns `delta * self`: `delta` applied after this transform.
    pub fn then(&self, delta: &Affine2) -> Self {
        Self { m: delta.m * self.m }
    }

    /// Determinant of the homogeneous matrix.
    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// True when every entry matches identity within `epsilon`.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.m - Matrix3::identity()).iter().all(|v| v.abs() < epsilon)
    }

    /// Transforms a floating point coordinate pair.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (
            m[(0, 0)] * x + m[(0, 1)] * y + m[(0, 2)],
            m[(1, 0)] * x + m[(1, 1)] * y + m[(1, 2)],
        )
    }

    /// Transforms a fixed-point coordinate, rounding to the nearest unit.
    pub fn apply_int(&self, p: IntPoint) -> IntPoint {
        let (x, y) = self.apply(p.x as f64, p.y as f64);
        IntPoint::from_f64(x, y)
    }

    /// Transforms every vertex of a polygon.
    pub fn apply_ngon(&self, polygon: &[IntPoint]) -> Ngon {
        polygon.iter().map(|p| self.apply_int(*p)).collect()
    }

    /// Transforms every polygon of a set.
    pub fn apply_ngons(&self, polygons: &[Ngon]) -> Ngons {
        polygons.iter().map(|p| self.apply_ngon(p)).collect()
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Affine2 {
    type Output = Affine2;

    fn mul(self, rhs: Affine2) -> Affine2 {
        Affine2 { m: self.m * rhs.m }
    }
}

/// Axis-aligned bounding box in fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntRect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl IntRect {
    pub const fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    /// Area as a float; widths above 2^31 would overflow an i64 product.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &IntRect) -> IntRect {
        IntRect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// The rectangle as a counter-clockwise polygon.
    pub fn to_ngon(&self) -> Ngon {
        vec![
            IntPoint::new(self.min_x, self.min_y),
            IntPoint::new(self.max_x, self.min_y),
            IntPoint::new(self.max_x, self.max_y),
            IntPoint::new(self.min_x, self.max_y),
        ]
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.min_x as f64,
            self.min_y as f64,
            self.max_x as f64,
            self.max_y as f64,
        )
    }
}

/// Axis-aligned rectangle in floating point units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle anchored at `(x, y)` with the given size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }
}
