//! NFP quality tiers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accuracy tier of a No-Fit-Polygon computation, cheapest first.
///
/// Ordering follows cost, so `a.min(b)` caps a tier at a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NestQuality {
    /// Sum of bounding boxes.
    Simple,
    /// Exact sum of convex hulls.
    Convex,
    /// Boundary sum over hulls at rigidness 0.25.
    ConcaveLight,
    /// Boundary sum over hulls at rigidness 0.55.
    ConcaveMedium,
    /// Boundary sum over hulls at rigidness 0.85.
    ConcaveHigh,
    /// Boundary sum over the unrelaxed outlines.
    ConcaveFull,
    /// Boundary sum unioned with per-vertex placements.
    #[default]
    Full,
}

impl NestQuality {
    /// All tiers in increasing cost.
    pub const ALL: [NestQuality; 7] = [
        NestQuality::Simple,
        NestQuality::Convex,
        NestQuality::ConcaveLight,
        NestQuality::ConcaveMedium,
        NestQuality::ConcaveHigh,
        NestQuality::ConcaveFull,
        NestQuality::Full,
    ];

    /// Hull rigidness used by the concave tiers.
    pub fn rigidness(self) -> Option<f64> {
        match self {
            NestQuality::ConcaveLight => Some(0.25),
            NestQuality::ConcaveMedium => Some(0.55),
            NestQuality::ConcaveHigh => Some(0.85),
            NestQuality::ConcaveFull => Some(1.0),
            _ => None,
        }
    }
}
