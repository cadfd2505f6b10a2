// core/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` type and its handler registration API.

use super::context_data::ContextData;
use super::control::PipelineControl;
use super::step::{SkipCondition, StepDef};
use crate::error::PipelineError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed async handler operating on the shared context of one run.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>> + Send + Sync,
>;

/// Ordered named steps with `on` and `after` handlers.
///
/// `Err` is whatever the handlers fail with; it must absorb [`PipelineError`]
/// so that misconfiguration surfaces through the same channel at run time.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
  // Handler registrations that named a step this pipeline does not define.
  pub(crate) unknown_steps: Vec<String>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` step tuples.
  pub fn new(name: &'static str, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step, optional, skip_if)| StepDef {
        name: (*step).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name,
      steps,
      on: HashMap::new(),
      after: HashMap::new(),
      unknown_steps: Vec::new(),
    }
  }

  fn has_step(&self, step_name: &str) -> bool {
    self.steps.iter().any(|s| s.name == step_name)
  }

  fn box_handler<F>(handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static) -> Handler<TData, Err>
  where
    F: Future<Output = Result<PipelineControl, Err>> + Send + 'static,
  {
    Box::new(move |ctx| Box::pin(handler_fn(ctx)))
  }

  /// Registers the main handler(s) of a step.
  pub fn on<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, Err>> + Send + 'static,
  {
    if !self.has_step(step_name) {
      self.unknown_steps.push(step_name.to_string());
      return;
    }
    self
      .on
      .entry(step_name.to_string())
      .or_default()
      .push(Self::box_handler(handler_fn));
  }

  /// Registers a handler that runs once the step's `on` handlers all continued.
  pub fn after<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, Err>> + Send + 'static,
  {
    if !self.has_step(step_name) {
      self.unknown_steps.push(step_name.to_string());
      return;
    }
    self
      .after
      .entry(step_name.to_string())
      .or_default()
      .push(Self::box_handler(handler_fn));
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.name)
      .field("steps", &self.steps)
      .finish_non_exhaustive()
  }
}
