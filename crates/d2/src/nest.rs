//! Greedy NFP placement.
//!
//! Shapes are ordered largest footprint first. The NFP of every ordered pair
//! is computed up front in parallel chunks, then shapes are placed one by one
//! at the fit-region vertex that keeps the far corner of the shape closest to
//! the origin.

use crate::boolean;
use crate::command::{translate_origin_to_zero, ExecContext};
use crate::geometry::canvas_fit_polygon;
use crate::library::PolyLibrary;
use crate::nfp::{compute_nfp, select_quality};
use polynest_core::geometry::{bounds, IntPoint, Ngon, Ngons};
use polynest_core::{Affine2, Error, Handle, IntRect, NestQuality, NestReport, Result};
use rayon::prelude::*;

/// Share of a nest's progress budget spent on the NFP matrix.
const NFP_PROGRESS_SHARE: f64 = 50.0;

/// Nests `handles` (all entries when `None`).
///
/// Temporary canvas and NFP entries are removed before returning, on success
/// and on failure alike.
pub fn nest(
    lib: &mut PolyLibrary,
    handles: Option<&[Handle]>,
    max_quality: NestQuality,
    ctx: &ExecContext<'_>,
) -> Result<NestReport> {
    let unique = lib.resolve(handles)?;
    let start = lib.len();
    let result = nest_ordered(lib, &unique, max_quality, ctx);
    lib.truncate(start);
    result
}

/// Adds one canvas-fit entry per handle. The canvas spans the summed extents
/// of all handles plus `margin`.
pub fn add_canvas_fit_polygons(
    lib: &mut PolyLibrary,
    handles: &[Handle],
    margin: i64,
) -> Result<Vec<Handle>> {
    let outlines = handles
        .iter()
        .map(|&h| lib.transformed_outer(h))
        .collect::<Result<Vec<_>>>()?;

    let (mut w, mut h) = (0, 0);
    for outline in &outlines {
        if let Some(b) = bounds(outline) {
            w += b.width();
            h += b.height();
        }
    }
    let canvas = IntRect::new(0, 0, w + margin, h + margin);

    Ok(outlines
        .iter()
        .map(|outline| lib.push(canvas_fit_polygon(&canvas, outline).into_iter().collect()))
        .collect())
}

fn nest_ordered(
    lib: &mut PolyLibrary,
    unique: &[Handle],
    max_quality: NestQuality,
    ctx: &ExecContext<'_>,
) -> Result<NestReport> {
    let mut report = NestReport::new();
    if unique.is_empty() {
        return Ok(report);
    }
    translate_origin_to_zero(lib, unique)?;

    let mut ordered: Vec<(Handle, IntRect)> = Vec::with_capacity(unique.len());
    for &h in unique {
        let outline = lib.transformed_outer(h)?;
        let bds = bounds(&outline)
            .ok_or_else(|| Error::InvalidGeometry(format!("entry {} has no outline", h)))?;
        ordered.push((h, bds));
    }
    ordered.sort_by_key(|(_, b)| std::cmp::Reverse(b.width().max(b.height())));

    let n = ordered.len();
    let handles: Vec<Handle> = ordered.iter().map(|(h, _)| *h).collect();
    let max_bound_area = ordered[0].1.area();
    log::info!("nesting {} shapes, max quality {:?}", n, max_quality);

    let canvas = add_canvas_fit_polygons(lib, &handles, ctx.config.canvas_margin)?;

    let Some(matrix) = nfp_matrix(lib, &handles, max_bound_area, max_quality, ctx)? else {
        log::info!("nest cancelled while computing NFPs");
        report.cancelled = true;
        report.unplaced = handles;
        return Ok(report);
    };

    let breaks = ctx.config.update_breaks;
    let interval = ctx.config.cancel_check_interval;
    let place_chunk = (n / breaks).max(1);
    let mut placed = vec![false; n];

    for i in 0..n {
        if i % interval == 0 && ctx.is_cancelled() {
            log::info!("nest cancelled after {} of {} placements", i, n);
            report.cancelled = true;
            report.unplaced.extend_from_slice(&handles[i..]);
            break;
        }

        let mut clip = Ngons::new();
        for j in (0..i).filter(|&j| placed[j]) {
            clip.extend(lib.transformed(cell(&matrix, n, i, j)?)?);
        }
        let fit = boolean::difference(&lib.transformed(canvas[i])?, &clip);

        let handle = handles[i];
        let o = lib.origin(handle)?;
        let bds = ordered[i].1;
        let Some(place) = best_vertex(&fit, bds.max_x - o.x, bds.max_y - o.y) else {
            log::warn!("no room left for entry {}", handle);
            report.unplaced.push(handle);
            continue;
        };

        let shift = place - o;
        let delta = Affine2::translation(shift.x as f64, shift.y as f64);
        lib.compose(handle, &delta)?;
        for k in i + 1..n {
            lib.compose(cell(&matrix, n, k, i)?, &delta)?;
        }
        placed[i] = true;
        report.placed.push(handle);

        if i % place_chunk == 0 {
            let done = (i + 1) as f64 / n as f64;
            ctx.report(
                NFP_PROGRESS_SHARE + done * (100.0 - NFP_PROGRESS_SHARE),
                "placement",
                i + 1,
                n,
            );
        }
    }

    log::info!(
        "nest finished: {} placed, {} unplaced",
        report.placed.len(),
        report.unplaced.len()
    );
    Ok(report)
}

/// Computes the NFP of every ordered pair (pattern row, subject column) and
/// stores each in the library. Returns `None` when cancelled between chunks.
fn nfp_matrix(
    lib: &mut PolyLibrary,
    handles: &[Handle],
    max_bound_area: f64,
    max_quality: NestQuality,
    ctx: &ExecContext<'_>,
) -> Result<Option<Vec<Option<Handle>>>> {
    let n = handles.len();
    let cells = n * n;
    let breaks = ctx.config.update_breaks;
    let tolerance = ctx.config.almost_rectangle_tolerance;
    let chunk = cells.div_ceil(breaks);

    let outlines = handles
        .iter()
        .map(|&h| lib.transformed_outer(h))
        .collect::<Result<Vec<Ngon>>>()?;
    let shapes = handles
        .iter()
        .map(|&h| lib.transformed(h))
        .collect::<Result<Vec<Ngons>>>()?;

    let mut matrix = vec![None; cells];
    for k in 0..breaks {
        let start = k * chunk;
        let end = ((k + 1) * chunk).min(cells);
        if start >= end {
            break;
        }

        let computed = (start..end)
            .into_par_iter()
            .filter(|i| i / n != i % n)
            .map(|i| {
                let (row, col) = (i / n, i % n);
                let quality = select_quality(
                    &outlines[col],
                    &outlines[row],
                    max_bound_area,
                    tolerance,
                    max_quality,
                );
                compute_nfp(&outlines[row], &shapes[col], quality, true).map(|nfp| (i, nfp))
            })
            .collect::<Result<Vec<_>>>()?;

        for (i, nfp) in computed {
            matrix[i] = Some(lib.push(nfp));
        }

        let progress = ((k + 1) as f64 / (breaks + 1) as f64 * NFP_PROGRESS_SHARE)
            .min(NFP_PROGRESS_SHARE);
        log::debug!("NFP chunk {} done ({} / {} cells)", k, end, cells);
        ctx.report(progress, "nfp", end, cells);

        if ctx.is_cancelled() {
            return Ok(None);
        }
    }
    Ok(Some(matrix))
}

fn cell(matrix: &[Option<Handle>], n: usize, row: usize, col: usize) -> Result<Handle> {
    matrix[row * n + col]
        .ok_or_else(|| Error::Internal(format!("NFP cell ({}, {}) was not computed", row, col)))
}

/// First vertex minimizing `max(x + ext_x, y + ext_y)`.
fn best_vertex(region: &[Ngon], ext_x: i64, ext_y: i64) -> Option<IntPoint> {
    let mut best: Option<(i64, IntPoint)> = None;
    for &cand in region.iter().flatten() {
        let score = (cand.x + ext_x).max(cand.y + ext_y);
        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, cand));
        }
    }
    best.map(|(_, p)| p)
}
