// txflow/src/registry.rs

//! Defines `Flows<S, E>`, a type-keyed registry that owns a unit source and
//! runs each registered pipeline atomically inside a fresh unit.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::core::unit::{UnitError, UnitSource};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Type-erased runner for one registered pipeline.
#[async_trait]
trait AnyFlowRunner<S, E>: Send + Sync
where
  S: UnitSource,
  E: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold the pipeline's `ContextData<TData>`.
  async fn run_erased(&self, source: &S, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, E>;
}

struct FlowRunner<TData, S, PErr, E>
where
  TData: 'static + Send + Sync,
  S: UnitSource,
  PErr: std::error::Error + From<FlowError> + From<UnitError<S::Unit>> + Send + Sync + 'static,
{
  pipeline: Pipeline<TData, S::Unit, PErr>,
  _phantom: PhantomData<fn() -> E>,
}

#[async_trait]
impl<TData, S, PErr, E> AnyFlowRunner<S, E> for FlowRunner<TData, S, PErr, E>
where
  TData: 'static + Send + Sync,
  S: UnitSource,
  PErr: std::error::Error + From<FlowError> + From<UnitError<S::Unit>> + Send + Sync + 'static,
  E: std::error::Error + From<PErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, source: &S, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, E> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>();
        event!(Level::ERROR, expected_type, "Context object type mismatch.");
        return Err(E::from(FlowError::TypeMismatch {
          step_name: "registry_dispatch".to_string(),
          expected_type: expected_type.to_string(),
        }));
      }
    };
    self.pipeline.run_atomic(source, ctx_data).await.map_err(E::from)
  }
}

/// The registry. Each context type maps to exactly one pipeline; registering a
/// second pipeline for the same type replaces the first.
pub struct Flows<S, E = FlowError>
where
  S: UnitSource,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  source: Arc<S>,
  registry: RwLock<HashMap<TypeId, Arc<dyn AnyFlowRunner<S, E>>>>,
}

impl<S, E> Flows<S, E>
where
  S: UnitSource,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(source: Arc<S>) -> Self {
    Self {
      source,
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// The unit source every run begins its unit from.
  pub fn source(&self) -> &Arc<S> {
    &self.source
  }

  /// Registers a pipeline under its context type `TData`.
  pub fn register_pipeline<TData, PErr>(&self, pipeline: Pipeline<TData, S::Unit, PErr>)
  where
    TData: 'static + Send + Sync,
    PErr: std::error::Error + From<FlowError> + From<UnitError<S::Unit>> + Send + Sync + 'static,
    E: From<PErr>,
  {
    event!(
      Level::DEBUG,
      tdata_type = %std::any::type_name::<TData>(),
      steps = ?pipeline.step_names(),
      "Registering pipeline."
    );
    let runner = FlowRunner::<TData, S, PErr, E> {
      pipeline,
      _phantom: PhantomData,
    };
    self.registry.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData` inside a new unit of work.
  #[instrument(
    name = "Flows::run",
    skip_all,
    fields(tdata_type = %std::any::type_name::<TData>())
  )]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, E>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.registry.read().get(&TypeId::of::<TData>()).cloned();
    let runner = runner.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No pipeline registered for TData type {}.", type_name);
      E::from(FlowError::ConfigurationError {
        step_name: "Flows::run".to_string(),
        message: format!("No pipeline registered for TData type {}", type_name),
      })
    })?;

    runner.run_erased(self.source.as_ref(), Box::new(ctx_data)).await
  }
}
