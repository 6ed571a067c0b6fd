// payout_engine/src/pipeline/execution.rs

//! `Pipeline::run`: executes steps in order against a shared context.

use crate::error::PipelineError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::{Phase, Pipeline};
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// For each step: evaluate `skip_if`, fail with `HandlerMissing` if a
  /// required step has no handlers, then run the `before`, `on` and `after`
  /// handlers in registration order. The first `Stop` or error ends the run.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_cond) = &step_def.skip_if {
        let skip = {
          let guard = ctx_data.read();
          skip_cond(&guard)
        };
        if skip {
          event!(Level::DEBUG, step = step_name, "Step skipped by its skip condition.");
          continue;
        }
      }

      if !self.has_any_handler(step_name) {
        if step_def.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no handlers.");
        return Err(Err::from(PipelineError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = info_span!("pipeline_step", step = step_name, step_index = step_idx);
      let control = self.run_step(step_name, &ctx_data).instrument(step_span).await?;
      if control == PipelineControl::Stop {
        event!(Level::INFO, step = step_name, "Pipeline stopped by a handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_name: &str, ctx_data: &ContextData<TData>) -> Result<PipelineControl, Err> {
    for phase in Phase::ALL {
      for (handler_idx, handler_fn) in self.handlers_for(step_name, phase).iter().enumerate() {
        match handler_fn(ctx_data.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
          Err(e) => {
            event!(Level::WARN, phase = phase.as_str(), handler_index = handler_idx, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(PipelineControl::Continue)
  }
}
