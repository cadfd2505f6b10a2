// core/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and drives their handlers.

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineResult};
use super::definition::{Handler, Pipeline};
use crate::error::PipelineError;
use tracing::{event, instrument, span, Instrument, Level};

enum Phase {
  Finished,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks to stop, or the first handler
  /// error unchanged. A non-optional step with no handlers fails with
  /// [`PipelineError::HandlerMissing`].
  #[instrument(name = "Pipeline::run", skip_all, fields(pipeline = self.name, num_steps = self.steps.len()), err(Display))]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    if let Some(step_name) = self.unknown_steps.first() {
      event!(Level::ERROR, %step_name, "Handler registered for an undefined step.");
      return Err(Err::from(PipelineError::StepNotFound {
        pipeline: self.name,
        step_name: step_name.clone(),
      }));
    }

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(Level::DEBUG, "pipeline_step", step_name, step_index = step_idx);

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(&ctx_data) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped.");
          continue;
        }
      }

      let on_handlers = self.on.get(step_name).filter(|v| !v.is_empty());
      let after_handlers = self.after.get(step_name).filter(|v| !v.is_empty());

      if on_handlers.is_none() && after_handlers.is_none() {
        if step_def.optional {
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(PipelineError::HandlerMissing {
          pipeline: self.name,
          step_name: step_def.name.clone(),
        }));
      }

      for handlers in [on_handlers, after_handlers].into_iter().flatten() {
        match run_phase(handlers, &ctx_data).instrument(step_span.clone()).await? {
          Phase::Finished => {}
          Phase::Stopped => {
            event!(Level::INFO, step_name, "Pipeline stopped by handler.");
            return Ok(PipelineResult::Stopped);
          }
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(handlers: &[Handler<TData, Err>], ctx_data: &ContextData<TData>) -> Result<Phase, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler_fn in handlers {
    match handler_fn(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(Phase::Stopped),
      Err(e) => {
        event!(Level::WARN, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(Phase::Finished)
}
