// txflow/src/pipeline/definition.rs

//! Contains the `Pipeline<TData, U, Err>` struct definition and methods for its
//! construction and structural modification.

use crate::core::handler::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::core::unit::UnitOfWork;
use crate::error::FlowError;
use std::collections::HashMap;

/// A pipeline over context data `TData`, executed inside units of type `U`,
/// whose handlers fail with `Err`.
///
/// `Err` must be constructible from `FlowError` (framework failures such as a
/// missing handler) and from the unit's own error (begin/commit failures).
pub struct Pipeline<TData, U, Err>
where
  TData: 'static + Send + Sync,
  U: UnitOfWork,
  Err: std::error::Error + From<FlowError> + From<U::Error> + Send + Sync + 'static,
{
  /// Ordered list of step definitions for this pipeline.
  pub(crate) steps: Vec<StepDef<TData>>,

  // Handlers for the three phases of each step, keyed by step name.
  pub(crate) before: HashMap<String, Vec<Handler<TData, U, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, U, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, U, Err>>>,
}

impl<TData, U, Err> Pipeline<TData, U, Err>
where
  TData: 'static + Send + Sync,
  U: UnitOfWork,
  Err: std::error::Error + From<FlowError> + From<U::Error> + Send + Sync + 'static,
{
  /// Creates a new `Pipeline` from `(name, optional, skip_if)` triples.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef::new(*name, *optional, skip_if.clone()))
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Names of the steps, in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  fn position_of(&self, step_name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == step_name)
  }

  /// Panics if the step is unknown. A typo in a step name is a setup bug,
  /// not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> usize {
    match self.position_of(step_name) {
      Some(idx) => idx,
      None => panic!("txflow setup error: Step '{}' not found in pipeline definition.", step_name),
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.position_of(step_name).is_some() {
      panic!("txflow setup error: Step '{}' already exists in pipeline definition.", step_name);
    }
  }

  // --- Basic Step Manipulation Methods ---

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    let idx = self.ensure_step_exists(existing_step_name);
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx, StepDef::new(name, optional, skip_if));
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    let idx = self.ensure_step_exists(existing_step_name);
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx + 1, StepDef::new(name, optional, skip_if));
  }

  /// Removes a step and its handlers. Removing an unknown step is a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Some(idx) = self.position_of(step_name) {
      self.steps.remove(idx);
      self.before.remove(step_name);
      self.on.remove(step_name);
      self.after.remove(step_name);
    }
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    let idx = self.ensure_step_exists(step_name);
    self.steps[idx].optional = optional;
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    let idx = self.ensure_step_exists(step_name);
    self.steps[idx].skip_if = skip_if;
  }
}
