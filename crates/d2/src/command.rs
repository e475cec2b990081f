//! Deferred commands and their execution against the polygon library.

use crate::geometry::{best_pose, convex_hull, refit_transform};
use crate::library::PolyLibrary;
use crate::nest;
use polynest_core::{
    Affine2, Config, Handle, NestQuality, NestReport, ProgressInfo, Rect, Result,
};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// A queued operation. Handle lists of `None` select every library entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Scales one entry about the origin.
    Scale { handle: Handle, sx: f64, sy: f64 },
    /// Rotates one entry counter-clockwise about the origin.
    Rotate { handle: Handle, theta: f64 },
    /// Translates one entry.
    Translate { handle: Handle, dx: f64, dy: f64 },
    /// Moves each entry so its first vertex sits on the origin.
    TranslateOriginToZero { handles: Option<Vec<Handle>> },
    /// Maps the joint bounding box of the entries onto `target`.
    Refit {
        target: Rect,
        stretch: bool,
        handles: Option<Vec<Handle>>,
    },
    /// Rotates each entry to its smallest upright bounding box.
    OptimalRotation { handles: Option<Vec<Handle>> },
    /// Packs the entries greedily from the origin corner.
    Nest {
        handles: Option<Vec<Handle>>,
        max_quality: NestQuality,
    },
}

impl Command {
    /// Short name used in logs and progress phases.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scale { .. } => "scale",
            Command::Rotate { .. } => "rotate",
            Command::Translate { .. } => "translate",
            Command::TranslateOriginToZero { .. } => "origin-to-zero",
            Command::Refit { .. } => "refit",
            Command::OptimalRotation { .. } => "optimal-rotation",
            Command::Nest { .. } => "nest",
        }
    }

    /// Runs the command. Nest commands return their placement report.
    pub fn execute(
        &self,
        lib: &mut PolyLibrary,
        ctx: &ExecContext<'_>,
    ) -> Result<Option<NestReport>> {
        match self {
            Command::Scale { handle, sx, sy } => {
                lib.compose(*handle, &Affine2::scale(*sx, *sy))?;
            }
            Command::Rotate { handle, theta } => {
                lib.compose(*handle, &Affine2::rotation(*theta))?;
            }
            Command::Translate { handle, dx, dy } => {
                lib.compose(*handle, &Affine2::translation(*dx, *dy))?;
            }
            Command::TranslateOriginToZero { handles } => {
                let unique = lib.resolve(handles.as_deref())?;
                translate_origin_to_zero(lib, &unique)?;
            }
            Command::Refit {
                target,
                stretch,
                handles,
            } => {
                let unique = lib.resolve(handles.as_deref())?;
                refit(lib, &unique, target, *stretch)?;
            }
            Command::OptimalRotation { handles } => {
                let unique = lib.resolve(handles.as_deref())?;
                optimal_rotation(lib, &unique)?;
            }
            Command::Nest {
                handles,
                max_quality,
            } => {
                let report = nest::nest(lib, handles.as_deref(), *max_quality, ctx)?;
                return Ok(Some(report));
            }
        }
        Ok(None)
    }
}

/// Receives progress updates from a running command.
pub type ProgressSink<'a> = &'a (dyn Fn(ProgressInfo) + Sync);

/// Execution environment shared by the commands of one run.
#[derive(Clone, Copy)]
pub struct ExecContext<'a> {
    pub config: &'a Config,
    cancelled: Option<&'a AtomicBool>,
    progress: Option<ProgressSink<'a>>,
    command_index: usize,
}

impl fmt::Debug for ExecContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("config", self.config)
            .field("cancelled", &self.is_cancelled())
            .field("progress", &self.progress.is_some())
            .field("command_index", &self.command_index)
            .finish()
    }
}

impl<'a> ExecContext<'a> {
    /// A context with no cancellation flag and no progress sink.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            cancelled: None,
            progress: None,
            command_index: 0,
        }
    }

    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn with_progress(mut self, sink: ProgressSink<'a>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_command_index(mut self, index: usize) -> Self {
        self.command_index = index;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Hands a progress update to the sink, if any.
    pub fn report(&self, percent: f64, phase: &str, done: usize, total: usize) {
        if let Some(sink) = self.progress {
            sink(ProgressInfo::new()
                .with_command(self.command_index)
                .with_percent(percent)
                .with_phase(phase)
                .with_items(done, total));
        }
    }
}

/// Translates every handle so its first transformed vertex is the origin.
pub fn translate_origin_to_zero(lib: &mut PolyLibrary, handles: &[Handle]) -> Result<()> {
    for &h in handles {
        let o = lib.origin(h)?;
        lib.compose(h, &Affine2::translation(-(o.x as f64), -(o.y as f64)))?;
    }
    Ok(())
}

/// Applies one shared scale and translation mapping the joint bounds of
/// `handles` onto `target`.
pub fn refit(lib: &mut PolyLibrary, handles: &[Handle], target: &Rect, stretch: bool) -> Result<()> {
    let mut points = Vec::new();
    for &h in handles {
        let entry = lib.get(h)?;
        let t = entry.transform();
        points.extend(
            entry
                .base()
                .iter()
                .flatten()
                .map(|p| t.apply(p.x as f64, p.y as f64)),
        );
    }
    let fit = refit_transform(points, target, stretch)?;
    let (scale, shift) = (fit.scale(), fit.translation());
    for &h in handles {
        lib.compose(h, &scale)?;
        lib.compose(h, &shift)?;
    }
    Ok(())
}

/// Rotates each handle about a hull vertex so that its bounding box is as
/// small as possible and taller than wide.
pub fn optimal_rotation(lib: &mut PolyLibrary, handles: &[Handle]) -> Result<()> {
    let outlines = handles
        .iter()
        .map(|&h| lib.transformed_outer(h))
        .collect::<Result<Vec<_>>>()?;

    let deltas: Vec<Option<Affine2>> = outlines
        .par_iter()
        .map(|outline| {
            let hull = convex_hull(outline, 0.0);
            best_pose(&hull).map(|pose| {
                let (px, py) = hull[pose.edge].to_f64();
                Affine2::translation(-px, -py)
                    .then(&Affine2::rotation(pose.rotation()))
                    .then(&Affine2::translation(px, py))
            })
        })
        .collect();

    for (&h, delta) in handles.iter().zip(deltas) {
        match delta {
            Some(d) => lib.compose(h, &d)?,
            None => log::warn!("entry {} has no outline to rotate", h),
        }
    }
    Ok(())
}
