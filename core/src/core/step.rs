// txflow/src/core/step.rs

//! Defines the structure for a single step within a pipeline.

use super::ContextData;

/// Skip condition evaluated right before a step runs. Returning `true` skips
/// all of the step's handlers.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// Definition of a pipeline step: its name, whether it may run without handlers,
/// and an optional skip condition over the pipeline context.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> StepDef<T> {
  pub fn new(name: impl Into<String>, optional: bool, skip_if: Option<SkipCondition<T>>) -> Self {
    Self {
      name: name.into(),
      optional,
      skip_if,
    }
  }

  pub(crate) fn should_skip(&self, ctx_data: &ContextData<T>) -> bool {
    self.skip_if.as_ref().map_or(false, |cond| cond(ctx_data.clone()))
  }
}

// SkipCondition is a closure, so only report whether one is set.
impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
