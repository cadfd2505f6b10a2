// core/src/pipeline/mod.rs

//! A small step pipeline used to drive the multi-step order operations.
//!
//! A pipeline is an ordered list of named steps. Each step carries `on` handlers
//! and, optionally, `after` handlers. Handlers receive a clone of the shared
//! [`ContextData`] and decide whether the run continues or stops.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};
