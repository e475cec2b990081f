//! Outcome of command buffer execution.

use crate::error::Error;

/// Outcome of one nest command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestReport {
    /// Handles that received a placement, in placement order.
    pub placed: Vec<usize>,

    /// Handles whose fit region was empty, or that were never reached.
    pub unplaced: Vec<usize>,

    /// Whether the nest stopped early on cancellation.
    pub cancelled: bool,
}

impl NestReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every handle was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty() && !self.cancelled
    }

    /// Returns the number of placed handles.
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }
}

/// How a command buffer run ended.
#[derive(Debug)]
pub enum RunStatus {
    /// Every command executed.
    Completed,
    /// Cancelled cooperatively; transforms were reset.
    Cancelled,
    /// A command failed; transforms were reset.
    Failed(Error),
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunStatus::Cancelled)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed(_))
    }
}

/// Terminal report of a command buffer run.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub status: RunStatus,

    /// One report per nest command that ran, in execution order.
    pub nests: Vec<NestReport>,

    /// Number of commands that ran to completion.
    pub commands_executed: usize,

    /// Number of queued commands discarded after a cancel or failure.
    pub commands_dropped: usize,
}

impl RunReport {
    /// Creates a report for a run that ended with `status`.
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            nests: Vec::new(),
            commands_executed: 0,
            commands_dropped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nest_report_all_placed() {
        let mut report = NestReport::new();
        report.placed = vec![0, 1];
        assert!(report.all_placed());
        assert_eq!(report.placed_count(), 2);
        report.unplaced.push(2);
        assert!(!report.all_placed());
    }

    #[test]
    fn test_run_status() {
        assert!(RunReport::new(RunStatus::Completed).status.is_completed());
        assert!(RunStatus::Cancelled.is_cancelled());
        assert!(RunStatus::Failed(Error::Cancelled).is_failed());
    }
}
