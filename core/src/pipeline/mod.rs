// payout_engine/src/pipeline/mod.rs

//! A small named-step workflow engine.
//!
//! Business processes (payout orchestration, webhook intake) are expressed as
//! a `Pipeline<TData, Err>`: an ordered list of steps, each with `before`,
//! `on` and `after` handlers operating on a shared `ContextData<TData>`.
//! Steps may be optional or carry a skip condition; any handler may stop the
//! run early or fail it with the pipeline's error type.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Phase, Pipeline};
pub use step::{SkipCondition, StepDef};
