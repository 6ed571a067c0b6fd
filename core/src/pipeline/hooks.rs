// payout_engine/src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use crate::error::PipelineError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use crate::pipeline::definition::{Handler, Phase, Pipeline};
use std::future::Future;
use tracing::{event, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Registers a handler that runs before the step's `on` handlers.
  ///
  /// The handler may return any error type convertible into the pipeline's `Err`.
  pub fn before<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.register(step_name, Phase::Before, handler_fn)
  }

  /// Registers the main handler of a step.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.register(step_name, Phase::On, handler_fn)
  }

  /// Registers a handler that runs after the step's `on` handlers.
  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.register(step_name, Phase::After, handler_fn)
  }

  /// Registers an already boxed handler, e.g. one built by a shared helper.
  pub fn add_handler(
    &mut self,
    step_name: &str,
    phase: Phase,
    handler: Handler<TData, Err>,
  ) -> Result<&mut Self, PipelineError> {
    self.ensure_step_exists(step_name)?;
    self
      .handlers
      .entry((step_name.to_string(), phase))
      .or_default()
      .push(handler);
    event!(Level::TRACE, pipeline = %self.name, step = step_name, phase = phase.as_str(), "Handler registered.");
    Ok(self)
  }

  fn register<F, UserErr>(
    &mut self,
    step_name: &str,
    phase: Phase,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.add_handler(step_name, phase, handler)
  }
}
