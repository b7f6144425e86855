// tests/unit_of_work_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use txflow::{ContextData, Pipeline, PipelineControl, PipelineResult, UnitHandle};

type TestPipeline = Pipeline<TestContext, TestUnit, TestError>;

fn three_step_pipeline() -> TestPipeline {
  let mut pipeline = TestPipeline::new(&[("reserve", false, None), ("write", false, None), ("finish", false, None)]);
  pipeline.on_step_boxed("reserve", create_write_handler("reserve", "reserved"));
  pipeline.on_step_boxed("write", create_write_handler("write", "written"));
  pipeline.on_step_boxed("finish", create_write_handler("finish", "finished"));
  pipeline
}

#[tokio::test]
#[serial]
async fn test_completed_run_commits_all_writes() {
  setup_tracing();
  let source = TestSource::default();
  let pipeline = three_step_pipeline();

  let result = pipeline.run_atomic(&source, ContextData::new(TestContext::default())).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(source.committed(), vec!["reserved", "written", "finished"]);
  assert_eq!(source.commits(), 1);
  assert_eq!(source.rollbacks(), 0);
}

#[tokio::test]
#[serial]
async fn test_failed_step_rolls_back_earlier_writes() {
  setup_tracing();
  let source = TestSource::default();
  let mut pipeline = three_step_pipeline();
  pipeline.before_step("finish", |_ctx: ContextData<TestContext>, _unit: UnitHandle<TestUnit>| async move {
    Err::<PipelineControl, _>(TestError::Handler("stock write failed".to_string()))
  });

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run_atomic(&source, ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("stock write failed".to_string()));
  // The first two steps wrote through the unit, yet nothing reached storage.
  assert_eq!(ctx.read().steps_executed, vec!["reserve", "write"]);
  assert!(source.committed().is_empty());
  assert_eq!(source.rollbacks(), 1);
}

#[tokio::test]
#[serial]
async fn test_stopped_run_still_commits() {
  setup_tracing();
  let source = TestSource::default();
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("reserve".to_string()),
    ..Default::default()
  });

  let result = pipeline.run_atomic(&source, ctx).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(source.committed(), vec!["reserved"]);
}

#[tokio::test]
#[serial]
async fn test_begin_failure_runs_nothing() {
  setup_tracing();
  let source = TestSource::default();
  source.fail_begin.store(true, Ordering::SeqCst);
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(TestContext::default());

  let result = pipeline.run_atomic(&source, ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Unit(TestUnitError::Unavailable));
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_commit_failure_is_reported() {
  setup_tracing();
  let source = TestSource::default();
  source.fail_commit.store(true, Ordering::SeqCst);
  let pipeline = three_step_pipeline();

  let result = pipeline.run_atomic(&source, ContextData::new(TestContext::default())).await;

  assert_eq!(result.unwrap_err(), TestError::Unit(TestUnitError::CommitRejected));
  assert!(source.committed().is_empty());
}

#[tokio::test]
#[serial]
async fn test_leaked_unit_handle_prevents_commit() {
  setup_tracing();
  let source = TestSource::default();
  let stash: Arc<parking_lot::Mutex<Option<UnitHandle<TestUnit>>>> = Arc::default();
  let mut pipeline = TestPipeline::new(&[("leak", false, None)]);
  let stash_for_handler = Arc::clone(&stash);
  pipeline.on_step("leak", move |_ctx: ContextData<TestContext>, unit: UnitHandle<TestUnit>| {
    let stash = Arc::clone(&stash_for_handler);
    async move {
      unit.lock().await.writes.push("leaked".to_string());
      *stash.lock() = Some(unit);
      Ok::<_, TestError>(PipelineControl::Continue)
    }
  });

  let result = pipeline.run_atomic(&source, ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("UnitLeaked")),
    other => panic!("Expected UnitLeaked, got {:?}", other),
  }
  assert!(source.committed().is_empty());
}
