// payout_engine/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its structural operations.

use crate::error::PipelineError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use crate::pipeline::step::StepDef;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A step handler: takes a clone of the shared context and resolves to a
/// flow signal or the pipeline's error type.
///
/// Handlers must drop every lock guard before their first `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// The three hook points of every step, run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub fn as_str(&self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

/// An ordered list of named steps with before/on/after handlers.
///
/// `Err` is the error every handler returns; it must absorb the engine's own
/// [`PipelineError`] so configuration problems surface through the same type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<(String, Phase), Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from its step definitions. Step names must be unique.
  pub fn new(name: &str, steps: Vec<StepDef<TData>>) -> Result<Self, PipelineError> {
    for (idx, step) in steps.iter().enumerate() {
      if steps[..idx].iter().any(|earlier| earlier.name == step.name) {
        return Err(PipelineError::ConfigurationError {
          step_name: step.name.clone(),
          message: format!("duplicate step name in pipeline '{}'", name),
        });
      }
    }
    Ok(Self {
      name: name.to_string(),
      steps,
      handlers: HashMap::new(),
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> Result<(), PipelineError> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Ok(())
    } else {
      Err(PipelineError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }

  pub(crate) fn handlers_for(&self, step_name: &str, phase: Phase) -> &[Handler<TData, Err>] {
    self
      .handlers
      .get(&(step_name.to_string(), phase))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub(crate) fn has_any_handler(&self, step_name: &str) -> bool {
    Phase::ALL.iter().any(|phase| !self.handlers_for(step_name, *phase).is_empty())
  }
}
