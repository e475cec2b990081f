//! Nesting scheduler: polygon library owner, command buffer and worker thread.

use crate::cluster::ClusterBuilder;
use crate::command::{Command, ExecContext};
use crate::geometry::canvas_fit_polygon;
use crate::library::PolyLibrary;
use crate::nest;
use crate::nfp::compute_nfp;
use polynest_core::geometry::{IntPoint, Ngons};
use polynest_core::{
    Affine2, Config, Error, Handle, IntRect, NestEvent, NestQuality, ProgressInfo, Rect,
    Result, RunReport, RunStatus,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// 2D nesting engine.
///
/// Shapes enter the library through [`Nester::add_polygons`]. Transform and
/// nest operations are queued and run together on a worker thread by
/// [`Nester::execute`].
///
/// ```rust
/// use polynest_d2::{Nester, NestQuality};
/// use polynest_core::geometry::IntPoint;
///
/// let mut nester = Nester::new();
/// let pts = vec![
///     IntPoint::new(0, 0),
///     IntPoint::new(100, 0),
///     IntPoint::new(100, 100),
///     IntPoint::new(0, 100),
/// ];
/// let handles = nester.add_polygons(&pts, &[0, 1, 2, 0, 2, 3], 0.0).unwrap();
/// nester.nest(None, NestQuality::Full);
/// let report = nester.execute().unwrap().wait().unwrap();
/// assert!(report.status.is_completed());
/// assert_eq!(nester.transformed_poly(handles[0]).unwrap().len(), 1);
/// ```
pub struct Nester {
    config: Config,
    library: Arc<Mutex<PolyLibrary>>,
    commands: VecDeque<Command>,
    cancelled: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Nester {
    /// Creates a nester with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a nester with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            library: Arc::new(Mutex::new(PolyLibrary::new())),
            commands: VecDeque::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, PolyLibrary>> {
        lock_library(&self.library)
    }

    /// Locks the library for a mutation that must not race a running buffer.
    fn lock_idle(&self) -> Result<MutexGuard<'_, PolyLibrary>> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.lock()
    }

    // ========================================================================
    // Library entry points
    // ========================================================================

    /// Clusters a triangulated mesh into polygon islands and adds one entry
    /// per island. Returns the handle of the island each vertex belongs to.
    ///
    /// Nothing is added when the mesh is rejected.
    pub fn add_polygons(
        &mut self,
        points: &[IntPoint],
        triangles: &[usize],
        miter_distance: f64,
    ) -> Result<Vec<Handle>> {
        let mut lib = self.lock_idle()?;
        let clusters = install(self.config.threads, || {
            ClusterBuilder::new(points, triangles)
                .with_miter_distance(miter_distance)
                .build()
        })?;

        let base = lib.len();
        for polygons in clusters.polygons {
            lib.push(polygons);
        }
        log::info!(
            "added {} polygon islands (library size {})",
            lib.len() - base,
            lib.len()
        );
        Ok(clusters
            .vertex_clusters
            .into_iter()
            .map(|c| c + base)
            .collect())
    }

    /// Computes the NFP of `pattern` around `subject` and stores it as a new
    /// entry.
    pub fn add_minkowski_sum(
        &mut self,
        subject: Handle,
        pattern: Handle,
        quality: NestQuality,
        flip: bool,
    ) -> Result<Handle> {
        let mut lib = self.lock_idle()?;
        let subject = lib.transformed(subject)?;
        let pattern = lib.transformed_outer(pattern)?;
        let nfp = compute_nfp(&pattern, &subject, quality, flip)?;
        Ok(lib.push(nfp))
    }

    /// Adds the rectangle of translations keeping `pattern` inside `canvas`.
    /// The entry is empty when the pattern cannot fit.
    pub fn add_canvas_fit_polygon(&mut self, canvas: IntRect, pattern: Handle) -> Result<Handle> {
        let mut lib = self.lock_idle()?;
        let outline = lib.transformed_outer(pattern)?;
        let fit: Ngons = canvas_fit_polygon(&canvas, &outline).into_iter().collect();
        Ok(lib.push(fit))
    }

    /// Adds canvas-fit entries for `handles` against a canvas sized to their
    /// summed extents plus the configured margin.
    pub fn add_canvas_fit_polygons(&mut self, handles: Option<&[Handle]>) -> Result<Vec<Handle>> {
        let mut lib = self.lock_idle()?;
        let unique = lib.resolve(handles)?;
        nest::add_canvas_fit_polygons(&mut lib, &unique, self.config.canvas_margin)
    }

    /// Every polygon of `handle` under its current transform.
    pub fn transformed_poly(&self, handle: Handle) -> Result<Ngons> {
        self.lock()?.transformed(handle)
    }

    /// Current transforms of `handles`, in order.
    pub(crate) fn transforms(&self, handles: &[Handle]) -> Result<Vec<Affine2>> {
        let lib = self.lock()?;
        handles
            .iter()
            .map(|&h| lib.get(h).map(|e| *e.transform()))
            .collect()
    }

    /// Number of library entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Resets every transform to identity.
    pub fn reset_transforms(&mut self) -> Result<()> {
        self.lock_idle()?.reset_transforms();
        Ok(())
    }

    /// Removes every library entry.
    pub fn clear(&mut self) -> Result<()> {
        self.lock_idle()?.clear();
        Ok(())
    }

    // ========================================================================
    // Command buffer
    // ========================================================================

    /// Appends a command to the buffer.
    pub fn push_command(&mut self, command: Command) -> &mut Self {
        self.commands.push_back(command);
        self
    }

    pub fn scale(&mut self, handle: Handle, sx: f64, sy: f64) -> &mut Self {
        self.push_command(Command::Scale { handle, sx, sy })
    }

    pub fn rotate(&mut self, handle: Handle, theta: f64) -> &mut Self {
        self.push_command(Command::Rotate { handle, theta })
    }

    pub fn translate(&mut self, handle: Handle, dx: f64, dy: f64) -> &mut Self {
        self.push_command(Command::Translate { handle, dx, dy })
    }

    pub fn translate_origin_to_zero(&mut self, handles: Option<&[Handle]>) -> &mut Self {
        self.push_command(Command::TranslateOriginToZero {
            handles: handles.map(<[Handle]>::to_vec),
        })
    }

    pub fn refit(&mut self, target: Rect, stretch: bool, handles: Option<&[Handle]>) -> &mut Self {
        self.push_command(Command::Refit {
            target,
            stretch,
            handles: handles.map(<[Handle]>::to_vec),
        })
    }

    pub fn optimal_rotation(&mut self, handles: Option<&[Handle]>) -> &mut Self {
        self.push_command(Command::OptimalRotation {
            handles: handles.map(<[Handle]>::to_vec),
        })
    }

    pub fn nest(&mut self, handles: Option<&[Handle]>, max_quality: NestQuality) -> &mut Self {
        self.push_command(Command::Nest {
            handles: handles.map(<[Handle]>::to_vec),
            max_quality,
        })
    }

    /// Number of queued commands.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Discards every queued command.
    pub fn clear_command_buffer(&mut self) {
        self.commands.clear();
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Runs the queued commands on a worker thread.
    ///
    /// On cancellation or failure the worker resets every transform and
    /// discards the rest of the buffer.
    pub fn execute(&mut self) -> Result<Execution> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.config.validate()?;
        if let Some(done) = self.worker.take() {
            if done.join().is_err() {
                log::warn!("previous worker panicked");
            }
        }

        self.cancelled.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
        let commands = std::mem::take(&mut self.commands);
        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            config: self.config.clone(),
            library: Arc::clone(&self.library),
            cancelled: Arc::clone(&self.cancelled),
            running: Arc::clone(&self.running),
            events: tx,
        };
        log::debug!("executing {} commands", commands.len());
        self.worker = Some(thread::spawn(move || worker.run(commands)));
        Ok(Execution { events: rx })
    }

    /// Runs the queued commands and blocks until they finish.
    pub fn execute_blocking(&mut self) -> Result<RunReport> {
        self.execute()?.wait()
    }

    /// Requests cooperative cancellation. Returns false when nothing runs.
    pub fn cancel(&self) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.cancelled.store(true, Ordering::Relaxed);
        true
    }

    /// Whether a command buffer is executing.
    ///
    /// Turns false before the `Finished` event is sent, so a caller that has
    /// received the report may start the next run right away.
    pub fn is_busy(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.worker.as_ref().map_or(false, |w| !w.is_finished())
    }
}

impl Default for Nester {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Nester {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Handle to a running command buffer.
pub struct Execution {
    events: Receiver<NestEvent>,
}

impl Execution {
    /// Blocks for the next event; `None` once the worker is gone.
    pub fn recv(&self) -> Option<NestEvent> {
        self.events.recv().ok()
    }

    /// Next event if one is ready.
    pub fn try_recv(&self) -> Option<NestEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Iterates over events until the worker exits.
    pub fn events(&self) -> impl Iterator<Item = NestEvent> + '_ {
        self.events.iter()
    }

    /// Blocks until the run finishes.
    pub fn wait(self) -> Result<RunReport> {
        self.wait_with_progress(|_| {})
    }

    /// Blocks until the run finishes, passing each progress update to `callback`.
    pub fn wait_with_progress<F>(self, mut callback: F) -> Result<RunReport>
    where
        F: FnMut(&ProgressInfo),
    {
        for event in self.events.iter() {
            match event {
                NestEvent::Progress(info) => callback(&info),
                NestEvent::Finished(report) => return Ok(report),
            }
        }
        Err(Error::Internal("worker exited without a report".into()))
    }
}

struct Worker {
    config: Config,
    library: Arc<Mutex<PolyLibrary>>,
    cancelled: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    events: Sender<NestEvent>,
}

impl Worker {
    fn run(self, mut commands: VecDeque<Command>) {
        let mut report = RunReport::new(RunStatus::Completed);
        let outcome = install(self.config.threads, || self.drain(&mut commands, &mut report));

        report.status = match outcome {
            Ok(()) => RunStatus::Completed,
            Err(Error::Cancelled) => RunStatus::Cancelled,
            Err(e) => RunStatus::Failed(e),
        };

        if !report.status.is_completed() {
            report.commands_dropped = commands.len();
            commands.clear();
            match self.library.lock() {
                Ok(mut lib) => lib.reset_transforms(),
                Err(poisoned) => poisoned.into_inner().reset_transforms(),
            }
            match &report.status {
                RunStatus::Failed(e) => log::warn!("command buffer failed: {}", e),
                _ => log::info!("command buffer cancelled"),
            }
        }

        let _ = self
            .events
            .send(NestEvent::Progress(ProgressInfo::new().with_percent(100.0).finished()));
        self.running.store(false, Ordering::Release);
        let _ = self.events.send(NestEvent::Finished(report));
    }

    fn drain(&self, commands: &mut VecDeque<Command>, report: &mut RunReport) -> Result<()> {
        let events = &self.events;
        let sink = move |info: ProgressInfo| {
            let _ = events.send(NestEvent::Progress(info));
        };
        let mut index = 0;
        while let Some(command) = commands.pop_front() {
            let ctx = ExecContext::new(&self.config)
                .with_cancel_flag(&self.cancelled)
                .with_progress(&sink)
                .with_command_index(index);

            let mut lib = lock_library(&self.library)?;
            log::debug!("command {}: {}", index, command.name());
            let nest = command.execute(&mut lib, &ctx)?;
            drop(lib);

            report.nests.extend(nest);
            report.commands_executed += 1;
            index += 1;

            if self.cancelled.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }
}

fn lock_library(library: &Mutex<PolyLibrary>) -> Result<MutexGuard<'_, PolyLibrary>> {
    library
        .lock()
        .map_err(|e| Error::Internal(format!("library lock poisoned: {}", e)))
}

/// Runs `op` on a dedicated rayon pool of `threads` workers, or on the
/// global pool when `threads` is 0.
fn install<R, F>(threads: usize, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> Result<R> + Send,
{
    if threads == 0 {
        return op();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build thread pool: {}", e)))?;
    pool.install(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mesh(x: i64, y: i64, s: i64) -> (Vec<IntPoint>, Vec<usize>) {
        (
            vec![
                IntPoint::new(x, y),
                IntPoint::new(x + s, y),
                IntPoint::new(x + s, y + s),
                IntPoint::new(x, y + s),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_add_polygons_offsets_handles() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        assert_eq!(nester.add_polygons(&pts, &tris, 0.0).unwrap(), vec![0; 4]);
        assert_eq!(nester.add_polygons(&pts, &tris, 0.0).unwrap(), vec![1; 4]);
        assert_eq!(nester.len().unwrap(), 2);
    }

    #[test]
    fn test_command_buffer_queue() {
        let mut nester = Nester::new();
        nester.scale(0, 2.0, 2.0).rotate(0, 1.0).translate(0, 1.0, 1.0);
        assert_eq!(nester.pending_commands(), 3);
        nester.clear_command_buffer();
        assert_eq!(nester.pending_commands(), 0);
    }

    #[test]
    fn test_cancel_when_idle_returns_false() {
        let nester = Nester::new();
        assert!(!nester.cancel());
        assert!(!nester.is_busy());
    }

    #[test]
    fn test_execute_applies_in_fifo_order() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        let h = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        nester.translate(h, 5.0, 0.0).scale(h, 2.0, 1.0);
        let report = nester.execute_blocking().unwrap();
        assert!(report.status.is_completed());
        assert_eq!(report.commands_executed, 2);
        let poly = nester.transformed_poly(h).unwrap();
        let b = polynest_core::geometry::set_bounds(&poly).unwrap();
        assert_eq!(b, IntRect::new(10, 0, 30, 10));
    }

    #[test]
    fn test_failure_resets_transforms_and_drops_queue() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        let h = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        nester
            .translate(h, 5.0, 5.0)
            .scale(7, 1.0, 1.0)
            .translate(h, 1.0, 1.0);
        let report = nester.execute_blocking().unwrap();
        assert!(matches!(
            report.status,
            RunStatus::Failed(Error::InvalidHandle { handle: 7, .. })
        ));
        assert_eq!(report.commands_executed, 1);
        assert_eq!(report.commands_dropped, 1);
        let b = polynest_core::geometry::set_bounds(&nester.transformed_poly(h).unwrap()).unwrap();
        assert_eq!(b, IntRect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_add_minkowski_sum() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        let a = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        let b = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        let nfp = nester
            .add_minkowski_sum(a, b, NestQuality::Simple, true)
            .unwrap();
        assert_eq!(nfp, 2);
        let b = polynest_core::geometry::set_bounds(&nester.transformed_poly(nfp).unwrap()).unwrap();
        assert_eq!(b, IntRect::new(-10, -10, 10, 10));
    }

    #[test]
    fn test_add_canvas_fit_polygon() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        let a = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        let fit = nester
            .add_canvas_fit_polygon(IntRect::new(0, 0, 50, 30), a)
            .unwrap();
        let b = polynest_core::geometry::set_bounds(&nester.transformed_poly(fit).unwrap()).unwrap();
        assert_eq!(b, IntRect::new(0, 0, 40, 20));

        let none = nester
            .add_canvas_fit_polygon(IntRect::new(0, 0, 5, 5), a)
            .unwrap();
        assert!(nester.transformed_poly(none).unwrap().is_empty());

        let fits = nester.add_canvas_fit_polygons(Some(&[a, a][..])).unwrap();
        assert_eq!(fits.len(), 1);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(3, 3, 10);
        let h = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        nester.translate_origin_to_zero(None);
        nester.execute_blocking().unwrap();
        let moved = nester.transformed_poly(h).unwrap();
        assert_eq!(moved[0][0], IntPoint::new(0, 0));
        nester.reset_transforms().unwrap();
        assert_eq!(nester.transformed_poly(h).unwrap()[0][0], IntPoint::new(3, 3));
        nester.clear().unwrap();
        assert!(nester.is_empty().unwrap());
    }

    #[test]
    fn test_idle_as_soon_as_report_arrives() {
        let mut nester = Nester::new();
        let (pts, tris) = square_mesh(0, 0, 10);
        let h = nester.add_polygons(&pts, &tris, 0.0).unwrap()[0];
        for _ in 0..200 {
            nester.translate(h, 1.0, 0.0);
            let report = nester.execute_blocking().unwrap();
            assert!(report.status.is_completed());
            assert!(!nester.is_busy());
            nester.reset_transforms().unwrap();
            nester.execute().unwrap().wait().unwrap();
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut nester = Nester::with_config(Config::new().with_update_breaks(0));
        assert!(matches!(nester.execute(), Err(Error::ConfigError(_))));
    }
}
