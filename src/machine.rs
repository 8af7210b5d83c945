use crate::app::{PipelineStatus, StageSnapshot, StageStatus};

/// Visual treatment for a finished pipeline: success and failure are
/// distinguished; canceled and skipped share neutral treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    Neutral,
}

/// Whether polling must stop after observing this status.
/// {pending, running, manual} keep the loop alive.
pub fn is_terminal(status: PipelineStatus) -> bool {
    matches!(
        status,
        PipelineStatus::Success
            | PipelineStatus::Failed
            | PipelineStatus::Canceled
            | PipelineStatus::Skipped
    )
}

pub fn outcome_for(status: PipelineStatus) -> Option<Outcome> {
    match status {
        PipelineStatus::Success => Some(Outcome::Succeeded),
        PipelineStatus::Failed => Some(Outcome::Failed),
        PipelineStatus::Canceled | PipelineStatus::Skipped => Some(Outcome::Neutral),
        PipelineStatus::Pending | PipelineStatus::Running | PipelineStatus::Manual => None,
    }
}

/// Owns the overall pipeline status across poll cycles.
///
/// There is no guarded transition table: the latest snapshot is the source of
/// truth, so the current state is replaced wholesale on every observation and
/// an out-of-order or regressing status from the backend is accepted as-is.
#[derive(Debug)]
pub struct PipelineMachine {
    current: PipelineStatus,
}

impl Default for PipelineMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineStatus::Pending,
        }
    }

    pub fn current(&self) -> PipelineStatus {
        self.current
    }

    /// Replace the state with the snapshot's status. Returns the terminal
    /// outcome if this observation must stop the polling loop.
    pub fn observe(&mut self, status: PipelineStatus) -> Option<Outcome> {
        self.current = status;
        outcome_for(status)
    }
}

/// The closing summary line: the last stage, scanning from the end, whose own
/// status has settled. Returns the 0-based position together with the stage.
pub fn closing_stage(stages: &[StageSnapshot]) -> Option<(usize, &StageSnapshot)> {
    stages.iter().enumerate().rev().find(|(_, s)| {
        matches!(
            s.status,
            StageStatus::Completed | StageStatus::Failed | StageStatus::Canceled
        )
    })
}
