// payout_engine/src/pipeline/control.rs

//! Signals for controlling pipeline flow and the outcome of a pipeline run.

/// Returned by every handler: keep going, or halt the pipeline here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// No further handlers in this step or later steps run.
  Stop,
}

/// Outcome of a full pipeline execution that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
