// txflow/src/pipeline/execution.rs

//! `Pipeline::run()` executes the steps against an open unit;
//! `Pipeline::run_atomic()` wraps a run in begin / commit / rollback.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::core::unit::{UnitHandle, UnitOfWork, UnitSource};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

/// What a phase of a step decided.
enum PhaseOutcome {
  Continue,
  Stop,
}

impl<TData, U, Err> Pipeline<TData, U, Err>
where
  TData: 'static + Send + Sync,
  U: UnitOfWork,
  Err: std::error::Error + From<FlowError> + From<U::Error> + Send + Sync + 'static,
{
  /// Executes the steps in order against an already open unit.
  ///
  /// The unit is neither committed nor rolled back here; see `run_atomic`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>, unit: UnitHandle<U>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!(
        "pipeline_step_execution",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if step_def.should_skip(&ctx_data) {
        event!(parent: &step_span, Level::DEBUG, "Step skipped due to 'skip_if' condition.");
        continue;
      }

      let before = self.before.get(step_name).filter(|v| !v.is_empty());
      let on = self.on.get(step_name).filter(|v| !v.is_empty());
      let after = self.after.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
        let Some(handlers) = handlers else { continue };
        let outcome = Self::run_phase(phase, handlers, &ctx_data, &unit)
          .instrument(step_span.clone())
          .await?;
        if let PhaseOutcome::Stop = outcome {
          event!(parent: &step_span, Level::INFO, phase, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step processing finished successfully.");
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(PipelineResult::Completed)
  }

  async fn run_phase(
    phase: &'static str,
    handlers: &[Handler<TData, U, Err>],
    ctx_data: &ContextData<TData>,
    unit: &UnitHandle<U>,
  ) -> Result<PhaseOutcome, Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let handler_span = tracing::debug_span!("handler", phase, handler_index = handler_idx);
      match handler_fn(ctx_data.clone(), unit.clone()).instrument(handler_span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PhaseOutcome::Stop),
        Err(e) => {
          event!(Level::WARN, error = %e, phase, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }

  /// Begins a unit from `source`, runs the pipeline in it, and then commits
  /// (on `Completed` or `Stopped`) or rolls back (on any error).
  ///
  /// When rollback itself fails the failure is logged and the handler's error
  /// is returned; the unit is discarded either way.
  #[instrument(
    name = "Pipeline::run_atomic",
    skip_all,
    fields(pipeline_context_data_type = %std::any::type_name::<TData>()),
    err(Display)
  )]
  pub async fn run_atomic<S>(&self, source: &S, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err>
  where
    S: UnitSource<Unit = U>,
  {
    let unit = source.begin().await.map_err(Err::from)?;
    let handle = UnitHandle::new(unit);
    let outcome = self.run(ctx_data, handle.clone()).await;

    // A leaked handle drops the unit here, which discards its writes.
    let reclaimed = handle.into_inner();

    match outcome {
      Ok(result) => {
        let unit = reclaimed.map_err(Err::from)?;
        unit.commit().await.map_err(Err::from)?;
        event!(Level::DEBUG, ?result, "Unit committed.");
        Ok(result)
      }
      Err(e) => {
        match reclaimed {
          Ok(unit) => {
            if let Err(rollback_err) = unit.rollback().await {
              event!(Level::ERROR, error = %rollback_err, "Rollback failed after handler error.");
            } else {
              event!(Level::DEBUG, "Unit rolled back.");
            }
          }
          Err(leak) => event!(Level::WARN, error = %leak, "Unit dropped without explicit rollback."),
        }
        Err(e)
      }
    }
  }
}
