//! Progress reporting for command buffer execution.

use crate::result::RunReport;

/// Progress information emitted while a command buffer runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressInfo {
    /// Overall percentage of the current command, in `[0, 100]`.
    pub percent: f64,
    /// Index of the command being executed.
    pub command_index: usize,
    /// Items processed within the current phase.
    pub items_done: usize,
    /// Items expected within the current phase (0 if unknown).
    pub items_total: usize,
    /// Current phase description.
    pub phase: String,
    /// Whether the command is still running.
    pub running: bool,
}

impl ProgressInfo {
    /// Creates a new progress info with default values.
    pub fn new() -> Self {
        Self {
            running: true,
            ..Default::default()
        }
    }

    /// Sets the percentage, clamped to `[0, 100]`.
    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets the command index.
    pub fn with_command(mut self, index: usize) -> Self {
        self.command_index = index;
        self
    }

    /// Sets the items processed info.
    pub fn with_items(mut self, done: usize, total: usize) -> Self {
        self.items_done = done;
        self.items_total = total;
        self
    }

    /// Sets the phase description.
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    /// Marks the command as finished.
    pub fn finished(mut self) -> Self {
        self.running = false;
        self
    }
}

/// Notification delivered from the worker thread.
#[derive(Debug)]
pub enum NestEvent {
    /// Intermediate progress.
    Progress(ProgressInfo),
    /// Terminal notification; always the last event of a run.
    Finished(RunReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(ProgressInfo::new().with_percent(140.0).percent, 100.0);
        assert_eq!(ProgressInfo::new().with_percent(-3.0).percent, 0.0);
    }

    #[test]
    fn test_builder() {
        let p = ProgressInfo::new()
            .with_command(2)
            .with_items(3, 9)
            .with_phase("placement")
            .finished();
        assert_eq!(p.command_index, 2);
        assert_eq!(p.items_done, 3);
        assert_eq!(p.items_total, 9);
        assert_eq!(p.phase, "placement");
        assert!(!p.running);
    }
}
