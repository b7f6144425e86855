// tests/context_management_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use txflow::{ContextData, Pipeline, PipelineControl, UnitHandle};

#[tokio::test]
#[serial]
async fn test_context_data_is_shared_between_steps() {
  setup_tracing();
  let source = Arc::new(TestSource::default());
  let mut pipeline =
    Pipeline::<TestContext, TestUnit, TestError>::new(&[("step1_modify", false, None), ("step2_read_modify", false, None)]);

  pipeline.on_step("step1_modify", |ctx: ContextData<TestContext>, _unit: UnitHandle<TestUnit>| async move {
    ctx.update(|data| {
      data.counter = 10;
      data.message = "SetByStep1".to_string();
    });
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  pipeline.on_step("step2_read_modify", |ctx: ContextData<TestContext>, _unit: UnitHandle<TestUnit>| async move {
    let (counter, message) = {
      let guard = ctx.read();
      (guard.counter, guard.message.clone())
    };
    if counter != 10 || message != "SetByStep1" {
      return Err(TestError::Handler(format!("unexpected context: {counter} / {message}")));
    }
    ctx.update(|data| {
      data.counter += 5;
      data.message.push_str("_ThenStep2");
    });
    Ok(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run_atomic(source.as_ref(), ctx.clone()).await.unwrap();

  let final_guard = ctx.read();
  assert_eq!(final_guard.counter, 15);
  assert_eq!(final_guard.message, "SetByStep1_ThenStep2");
}

#[tokio::test]
#[serial]
async fn test_context_data_clone_shares_data() {
  setup_tracing();
  let original_ctx = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned_ctx = original_ctx.clone();

  original_ctx.write().counter = 5;
  assert_eq!(cloned_ctx.read().counter, 5);

  cloned_ctx.write().counter = 10;
  assert_eq!(original_ctx.read().counter, 10);
}

#[tokio::test]
#[serial]
async fn test_map_read_and_into_inner() {
  setup_tracing();
  let ctx = ContextData::new(TestContext {
    message: "hello".to_string(),
    ..Default::default()
  });
  assert_eq!(&*ctx.map_read(|c| &c.message), "hello");

  // Another handle is alive, so into_inner clones.
  let other = ctx.clone();
  let copied = ctx.into_inner();
  assert_eq!(copied.message, "hello");

  // Last handle: the data is moved out.
  other.write().counter = 3;
  assert_eq!(other.into_inner().counter, 3);
}

// Guards are scoped so none lives across the `.await`.
#[tokio::test]
#[serial]
async fn test_context_data_locks_with_await() {
  setup_tracing();
  let ctx = ContextData::new(TestContext::default());

  let handler_logic = async {
    let initial_count = ctx.read().counter;
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ctx.write().counter = initial_count + 1;
  };

  handler_logic.await;
  assert_eq!(ctx.read().counter, 1);
}
