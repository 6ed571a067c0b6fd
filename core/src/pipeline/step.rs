// payout_engine/src/pipeline/step.rs

use std::sync::Arc;

/// Evaluated under a read lock right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// One named step of a pipeline.
#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  /// Optional steps may be left without handlers.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> StepDef<TData> {
  pub fn required(name: &str) -> Self {
    Self {
      name: name.to_string(),
      optional: false,
      skip_if: None,
    }
  }

  pub fn optional(name: &str) -> Self {
    Self {
      name: name.to_string(),
      optional: true,
      skip_if: None,
    }
  }

  pub fn skip_if(mut self, condition: impl Fn(&TData) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(condition));
    self
  }
}

// SkipCondition has no Debug impl, so report only whether one is present.
impl<TData: 'static + Send + Sync> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
