// core/src/pipeline/control.rs

//! Flow signals returned by handlers and the outcome of a whole run.

/// Signal from a handler indicating whether the pipeline should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Run the remaining handlers of this step and the following steps.
  Continue,
  /// Halt immediately. No further handlers run.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every non-skipped step ran to the end.
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
