//! No-Fit Polygon (NFP) computation.
//!
//! The NFP of a pattern against a subject is the set of translations that
//! make the pattern overlap the subject. With `flip` set the pattern is
//! negated, which turns the Minkowski sum into the translation region used
//! by the nester.
//!
//! ## Tiers
//!
//! | Tier | Method |
//! |------|--------|
//! | `Simple` | Sum of bounding boxes |
//! | `Convex` | Edge merge of the two convex hulls |
//! | `ConcaveLight` .. `ConcaveFull` | Boundary sum over relaxed hulls, outer region only |
//! | `Full` | Boundary sum unioned with the subject placed at every pattern vertex |

use crate::boolean;
use crate::geometry::{convex_hull, is_almost_rectangle};
use crate::minkowski::sum_boundary;
use crate::minkowski::sum_boundary_set;
use polynest_core::geometry::{
    bottom_left_index, bounds, clone_set_shifted, clone_shifted, signed_area2, IntPoint, Ngon,
    Ngons,
};
use polynest_core::{Error, IntRect, NestQuality, Result};

/// Area ratio above which a pattern dwarfs its subject.
const DWARF_RATIO: f64 = 1000.0;

/// Subjects below this share of the largest bounding area use `Simple`.
const TINY_SHARE: f64 = 0.05;

/// Computes the NFP of `pattern` around `subject` at the given tier.
///
/// Only the first polygon of `subject` is used by every tier but `Full`.
pub fn compute_nfp(
    pattern: &[IntPoint],
    subject: &[Ngon],
    quality: NestQuality,
    flip: bool,
) -> Result<Ngons> {
    if pattern.len() < 3 {
        return Err(Error::InvalidGeometry(format!(
            "NFP pattern needs at least 3 vertices, got {}",
            pattern.len()
        )));
    }
    if subject.first().map_or(true, |s| s.len() < 3) {
        return Err(Error::InvalidGeometry(
            "NFP subject has no outer polygon".into(),
        ));
    }

    let mut pattern = pattern.to_vec();
    if signed_area2(&pattern) < 0 {
        pattern.reverse();
    }

    match quality {
        NestQuality::Simple => Ok(nfp_simple(&pattern, &subject[0], flip)),
        NestQuality::Convex => nfp_convex(&pattern, &subject[0], flip),
        NestQuality::ConcaveLight
        | NestQuality::ConcaveMedium
        | NestQuality::ConcaveHigh
        | NestQuality::ConcaveFull => {
            let rigidness = quality.rigidness().unwrap_or(1.0);
            Ok(nfp_concave(&pattern, &subject[0], rigidness, flip))
        }
        NestQuality::Full => Ok(nfp_full(&pattern, subject, flip)),
    }
}

fn nfp_simple(pattern: &[IntPoint], subject: &[IntPoint], flip: bool) -> Ngons {
    let (Some(mut p), Some(s)) = (bounds(pattern), bounds(subject)) else {
        return Ngons::new();
    };
    if flip {
        p = IntRect::new(-p.max_x, -p.max_y, -p.min_x, -p.min_y);
    }
    let sum = IntRect::new(
        p.min_x + s.min_x,
        p.min_y + s.min_y,
        p.max_x + s.max_x,
        p.max_y + s.max_y,
    );
    vec![sum.to_ngon()]
}

fn nfp_convex(pattern: &[IntPoint], subject: &[IntPoint], flip: bool) -> Result<Ngons> {
    let hp = convex_hull(&clone_shifted(pattern, IntPoint::default(), flip), 0.0);
    let hs = convex_hull(subject, 0.0);
    let (np, ns) = (hp.len(), hs.len());
    if np < 3 || ns < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "convex hull collapsed to {} / {} vertices",
            np, ns
        )));
    }

    let sp = bottom_left_index(&hp);
    let ss = bottom_left_index(&hs);

    let mut poly: Ngon = Vec::with_capacity(np + ns);
    let (mut i, mut j) = (0, 0);
    while i < np || j < ns {
        let ii = (sp + i) % np;
        let jj = (ss + j) % ns;
        poly.push(hp[ii] + hs[jj]);

        if i == np {
            j += 1;
            continue;
        }
        if j == ns {
            i += 1;
            continue;
        }

        let v = hp[(sp + i + 1) % np] - hp[ii];
        let w = hs[(ss + j + 1) % ns] - hs[jj];
        let cross = v.cross(w);
        if cross > 0 {
            i += 1;
        } else if cross < 0 {
            j += 1;
        } else if v.dot(w) > 0 {
            i += 1;
            j += 1;
        } else {
            return Err(Error::DegenerateGeometry(format!(
                "anti-parallel hull edges at pattern vertex {} / subject vertex {}",
                ii, jj
            )));
        }
    }
    Ok(boolean::simplify(&[poly]))
}

fn nfp_concave(pattern: &[IntPoint], subject: &[IntPoint], rigidness: f64, flip: bool) -> Ngons {
    let mut patt = clone_shifted(pattern, IntPoint::default(), flip);
    let mut subj = subject.to_vec();
    if signed_area2(&subj) < 0 {
        subj.reverse();
    }
    if rigidness < 1.0 {
        subj = convex_hull(&subj, rigidness);
        patt = convex_hull(&patt, rigidness);
    }
    let sum = sum_boundary(&patt, &subj, false);
    boolean::largest_outer(&sum).into_iter().collect()
}

fn nfp_full(pattern: &[IntPoint], subject: &[Ngon], flip: bool) -> Ngons {
    let swept = sum_boundary_set(pattern, subject, flip);
    let sign = if flip { -1 } else { 1 };
    let placed: Ngons = pattern
        .iter()
        .flat_map(|v| clone_set_shifted(subject, IntPoint::new(sign * v.x, sign * v.y), false))
        .collect();
    boolean::union(&boolean::simplify(&placed), &swept)
}

/// Picks the cheapest adequate tier for an NFP of `pattern` around `subject`,
/// capped at `max`.
///
/// `max_bound_area` is the bounding box area of the largest shape in the batch.
pub fn select_quality(
    subject: &[IntPoint],
    pattern: &[IntPoint],
    max_bound_area: f64,
    rectangle_tolerance: f64,
    max: NestQuality,
) -> NestQuality {
    quality_for(subject, pattern, max_bound_area, rectangle_tolerance).min(max)
}

fn quality_for(
    subject: &[IntPoint],
    pattern: &[IntPoint],
    max_bound_area: f64,
    rectangle_tolerance: f64,
) -> NestQuality {
    if is_almost_rectangle(subject, rectangle_tolerance)
        && is_almost_rectangle(pattern, rectangle_tolerance)
    {
        return NestQuality::Simple;
    }

    let s_a = bounds(subject).map_or(0.0, |b| b.area());
    let p_a = bounds(pattern).map_or(0.0, |b| b.area());

    if p_a / s_a > DWARF_RATIO || s_a / max_bound_area < TINY_SHARE {
        return NestQuality::Simple;
    }

    let ratio = p_a / s_a;
    if ratio > 100.0 {
        NestQuality::Convex
    } else if ratio > 50.0 {
        NestQuality::ConcaveLight
    } else if ratio > 10.0 {
        NestQuality::ConcaveMedium
    } else if ratio > 2.0 {
        NestQuality::ConcaveHigh
    } else if ratio > 0.25 {
        NestQuality::ConcaveFull
    } else {
        NestQuality::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polynest_core::geometry::{set_bounds, set_signed_area};

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Ngon {
        vec![
            IntPoint::new(x0, y0),
            IntPoint::new(x1, y0),
            IntPoint::new(x1, y1),
            IntPoint::new(x0, y1),
        ]
    }

    fn l_shape() -> Ngon {
        vec![
            IntPoint::new(0, 0),
            IntPoint::new(30, 0),
            IntPoint::new(30, 10),
            IntPoint::new(10, 10),
            IntPoint::new(10, 30),
            IntPoint::new(0, 30),
        ]
    }

    fn triangle() -> Ngon {
        vec![IntPoint::new(0, 0), IntPoint::new(10, 0), IntPoint::new(0, 10)]
    }

    #[test]
    fn test_simple_flipped_squares() {
        let nfp = compute_nfp(&rect(0, 0, 10, 10), &[rect(0, 0, 10, 10)], NestQuality::Simple, true)
            .unwrap();
        assert_eq!(nfp, vec![rect(-10, -10, 10, 10)]);
    }

    #[test]
    fn test_convex_square_triangle() {
        let nfp = compute_nfp(&triangle(), &[rect(0, 0, 10, 10)], NestQuality::Convex, false)
            .unwrap();
        assert_eq!(nfp.len(), 1);
        assert_eq!(set_bounds(&nfp).unwrap(), IntRect::new(0, 0, 20, 20));
        // square 100 + triangle 50 + mixed area 2 * 100
        assert_eq!(set_signed_area(&nfp), 350.0);
    }

    #[test]
    fn test_convex_flip_matches_simple_for_rectangles() {
        let a = rect(0, 0, 20, 10);
        let b = rect(0, 0, 5, 5);
        let convex = compute_nfp(&b, &[a.clone()], NestQuality::Convex, true).unwrap();
        let simple = compute_nfp(&b, &[a], NestQuality::Simple, true).unwrap();
        assert_eq!(set_bounds(&convex), set_bounds(&simple));
        assert_eq!(set_signed_area(&convex), set_signed_area(&simple));
    }

    #[test]
    fn test_tiers_stay_within_simple_bounds() {
        let subject = vec![l_shape()];
        let pattern = triangle();
        let coarse = set_bounds(
            &compute_nfp(&pattern, &subject, NestQuality::Simple, true).unwrap(),
        )
        .unwrap();
        for quality in NestQuality::ALL {
            let nfp = compute_nfp(&pattern, &subject, quality, true).unwrap();
            let b = set_bounds(&nfp).unwrap();
            assert!(b.min_x >= coarse.min_x && b.max_x <= coarse.max_x, "{:?}", quality);
            assert!(b.min_y >= coarse.min_y && b.max_y <= coarse.max_y, "{:?}", quality);
        }
    }

    #[test]
    fn test_concave_full_keeps_notch() {
        let subject = vec![l_shape()];
        let pattern = rect(0, 0, 5, 5);
        let exact = compute_nfp(&pattern, &subject, NestQuality::ConcaveFull, true).unwrap();
        let hull = compute_nfp(&pattern, &subject, NestQuality::Convex, true).unwrap();
        assert_eq!(exact.len(), 1);
        assert!(set_signed_area(&exact) < set_signed_area(&hull));
        // inside the notch, away from both arms
        assert!(!boolean::contains_point(&exact[0], IntPoint::new(18, 18)));
        assert!(boolean::contains_point(&hull[0], IntPoint::new(18, 18)));
    }

    #[test]
    fn test_full_fills_interior() {
        let subject = vec![rect(0, 0, 40, 40)];
        let pattern = rect(0, 0, 4, 4);
        let nfp = compute_nfp(&pattern, &subject, NestQuality::Full, true).unwrap();
        assert_eq!(nfp.len(), 1);
        assert_eq!(set_bounds(&nfp).unwrap(), IntRect::new(-4, -4, 40, 40));
        assert_eq!(set_signed_area(&nfp), 44.0 * 44.0);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let seg = vec![IntPoint::new(0, 0), IntPoint::new(1, 1)];
        assert!(compute_nfp(&seg, &[rect(0, 0, 1, 1)], NestQuality::Full, true).is_err());
        assert!(compute_nfp(&triangle(), &[], NestQuality::Simple, true).is_err());
        let flat = vec![IntPoint::new(0, 0), IntPoint::new(5, 0), IntPoint::new(10, 0)];
        let err = compute_nfp(&triangle(), &[flat], NestQuality::Convex, true).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
    }

    #[test]
    fn test_select_quality() {
        let sq = rect(0, 0, 10, 10);
        assert_eq!(
            select_quality(&sq, &sq, 100.0, 0.05, NestQuality::Full),
            NestQuality::Simple
        );

        let l = l_shape();
        // equal bounds: ratio 1 lands in ConcaveFull
        assert_eq!(
            select_quality(&l, &l, 900.0, 0.05, NestQuality::Full),
            NestQuality::ConcaveFull
        );
        assert_eq!(
            select_quality(&l, &l, 900.0, 0.05, NestQuality::Convex),
            NestQuality::Convex
        );
        // tiny subject relative to the batch
        assert_eq!(
            select_quality(&l, &l, 900.0 * 100.0, 0.05, NestQuality::Full),
            NestQuality::Simple
        );

        let big = vec![
            IntPoint::new(0, 0),
            IntPoint::new(300, 0),
            IntPoint::new(300, 30),
            IntPoint::new(30, 30),
            IntPoint::new(30, 300),
            IntPoint::new(0, 300),
        ];
        // pattern bounds 90000 over subject 900
        assert_eq!(
            select_quality(&l, &big, 900.0, 0.05, NestQuality::Full),
            NestQuality::ConcaveLight
        );
    }
}
