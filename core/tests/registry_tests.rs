// tests/registry_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use txflow::{ContextData, FlowError, Flows, Pipeline, PipelineControl, PipelineResult, UnitHandle};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RegistryContextAlpha {
  val: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RegistryContextBeta {
  num: i32,
}

fn registry_with_alpha_and_beta(source: Arc<TestSource>) -> Flows<TestSource, TestError> {
  let flows = Flows::<TestSource, TestError>::new(source);

  let mut p_alpha = Pipeline::<RegistryContextAlpha, TestUnit, TestError>::new(&[("alpha_task", false, None)]);
  p_alpha.on_step("alpha_task", |ctx: ContextData<RegistryContextAlpha>, unit: UnitHandle<TestUnit>| async move {
    ctx.write().val = "alpha_processed".to_string();
    unit.lock().await.writes.push("alpha".to_string());
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  flows.register_pipeline(p_alpha);

  // Handlers may fail with the framework error directly.
  let mut p_beta = Pipeline::<RegistryContextBeta, TestUnit, TestError>::new(&[("beta_task", false, None)]);
  p_beta.on_step("beta_task", |ctx: ContextData<RegistryContextBeta>, _unit: UnitHandle<TestUnit>| async move {
    let num = ctx.read().num;
    if num < 0 {
      return Err(FlowError::HandlerError {
        source: anyhow::anyhow!("negative input"),
      });
    }
    ctx.write().num = num + 100;
    Ok(PipelineControl::Continue)
  });
  flows.register_pipeline(p_beta);

  flows
}

#[tokio::test]
#[serial]
async fn test_registry_runs_pipeline_for_context_type() {
  setup_tracing();
  let source = Arc::new(TestSource::default());
  let flows = registry_with_alpha_and_beta(Arc::clone(&source));
  assert!(flows.is_registered::<RegistryContextAlpha>());
  assert!(flows.is_registered::<RegistryContextBeta>());

  let ctx_alpha = ContextData::new(RegistryContextAlpha::default());
  assert_eq!(flows.run(ctx_alpha.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_alpha.read().val, "alpha_processed");

  let ctx_beta = ContextData::new(RegistryContextBeta { num: 1 });
  assert_eq!(flows.run(ctx_beta.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_beta.read().num, 101);

  // Each run got its own unit, and both committed.
  assert_eq!(source.commits(), 2);
  assert_eq!(source.committed(), vec!["alpha"]);
}

#[tokio::test]
#[serial]
async fn test_registry_handler_error_rolls_back() {
  setup_tracing();
  let source = Arc::new(TestSource::default());
  let flows = registry_with_alpha_and_beta(Arc::clone(&source));

  let result = flows.run(ContextData::new(RegistryContextBeta { num: -1 })).await;

  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("negative input")),
    other => panic!("Expected a wrapped FlowError, got {:?}", other),
  }
  assert_eq!(source.rollbacks(), 1);
  assert_eq!(source.commits(), 0);
}

#[tokio::test]
#[serial]
async fn test_registry_pipeline_not_found() {
  setup_tracing();
  let flows = Flows::<TestSource, TestError>::new(Arc::new(TestSource::default()));
  assert!(!flows.is_registered::<RegistryContextAlpha>());

  let result = flows.run(ContextData::new(RegistryContextAlpha::default())).await;

  match result {
    Err(TestError::Flow(msg)) => {
      assert!(msg.contains("ConfigurationError"));
      assert!(msg.contains("No pipeline registered"));
    }
    other => panic!("Expected ConfigurationError, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_registry_runs_concurrently() {
  setup_tracing();
  let source = Arc::new(TestSource::default());
  let flows = Arc::new(registry_with_alpha_and_beta(Arc::clone(&source)));

  let mut tasks = Vec::new();
  for _ in 0..8 {
    let flows = Arc::clone(&flows);
    tasks.push(tokio::spawn(async move {
      flows.run(ContextData::new(RegistryContextAlpha::default())).await
    }));
  }
  for task in tasks {
    assert_eq!(task.await.unwrap().unwrap(), PipelineResult::Completed);
  }
  assert_eq!(source.committed().len(), 8);
}
