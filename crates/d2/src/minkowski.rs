//! Boundary Minkowski sums.
//!
//! A pattern is swept along every edge of a path; each edge contributes the
//! pattern placed at both endpoints plus the quads traced by the pattern's
//! edges between them. Contributions are merged with a running union.

use crate::boolean;
use polynest_core::geometry::{clone_shifted, signed_area2, IntPoint, Ngon, Ngons};

/// Pattern swept along the segment `p1 -> p2`.
///
/// The pattern is negated first when `flip` is set. A zero-length segment
/// yields a single placed copy.
pub fn sum_segment(pattern: &[IntPoint], p1: IntPoint, p2: IntPoint, flip: bool) -> Ngons {
    let first = oriented(clone_shifted(pattern, p1, flip));
    if p1 == p2 {
        return vec![first];
    }

    let base = clone_shifted(pattern, IntPoint::default(), flip);
    let n = base.len();
    let mut pieces: Ngons = Vec::with_capacity(n + 2);
    pieces.push(first);
    pieces.push(oriented(clone_shifted(pattern, p2, flip)));
    for k in 0..n {
        let a = base[k];
        let b = base[(k + 1) % n];
        let quad = vec![a + p1, b + p1, b + p2, a + p2];
        if signed_area2(&quad) != 0 {
            pieces.push(oriented(quad));
        }
    }
    boolean::simplify(&pieces)
}

/// Running union of [`sum_segment`] over every edge of the closed `path`.
pub fn sum_boundary(pattern: &[IntPoint], path: &[IntPoint], flip: bool) -> Ngons {
    let n = path.len();
    let mut acc = Ngons::new();
    for i in 0..n {
        let seg = sum_segment(pattern, path[i], path[(i + 1) % n], flip);
        acc = boolean::union(&acc, &seg);
    }
    acc
}

/// [`sum_boundary`] over each path of a set, merged into one result.
pub fn sum_boundary_set(pattern: &[IntPoint], paths: &[Ngon], flip: bool) -> Ngons {
    paths.iter().fold(Ngons::new(), |acc, path| {
        boolean::union(&acc, &sum_boundary(pattern, path, flip))
    })
}

fn oriented(mut ngon: Ngon) -> Ngon {
    if signed_area2(&ngon) < 0 {
        ngon.reverse();
    }
    ngon
}
