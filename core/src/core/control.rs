// txflow/src/core/control.rs

//! Signals for controlling pipeline flow and the outcome of a run.

/// Signal from a handler indicating whether the pipeline should continue or stop.
///
/// Failing is not a control signal: a handler that wants the unit rolled back
/// returns `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Keep going with the remaining handlers and steps.
  Continue,
  /// Finish the run now. No further handlers execute, and the unit of work
  /// is committed with whatever has been written so far.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step that was not skipped ran to completion.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}

impl PipelineResult {
  pub fn is_completed(self) -> bool {
    matches!(self, PipelineResult::Completed)
  }
}
