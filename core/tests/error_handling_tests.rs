// tests/error_handling_tests.rs
mod common;
use common::*;
use serial_test::serial;
use std::sync::Arc;
use txflow::{ContextData, FlowError, Flows, Pipeline, PipelineControl, UnitHandle};

#[tokio::test]
#[serial]
async fn test_pipeline_run_catches_handler_missing() {
  setup_tracing();
  let source = TestSource::default();
  let pipeline = Pipeline::<TestContext, TestUnit, TestError>::new(&[("missing", false, None)]);

  let result = pipeline.run_atomic(&source, ContextData::new(TestContext::default())).await;

  match result.unwrap_err() {
    TestError::Flow(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Flow(HandlerMissing), got {:?}", other),
  }
  assert_eq!(source.rollbacks(), 1);
}

#[test]
fn test_anyhow_wrapping_preserves_flow_errors() {
  let inner = anyhow::Error::new(FlowError::UnitLeaked);
  assert!(matches!(FlowError::from(inner), FlowError::UnitLeaked));

  let foreign = anyhow::anyhow!("socket closed");
  match FlowError::from(foreign) {
    FlowError::HandlerError { source } => assert_eq!(source.to_string(), "socket closed"),
    other => panic!("Expected HandlerError, got {:?}", other),
  }
}

// A flow whose error type IS FlowError: unit errors must convert into it too.
#[derive(Debug, thiserror::Error)]
#[error("plain unit error")]
struct PlainUnitError;

impl From<PlainUnitError> for FlowError {
  fn from(err: PlainUnitError) -> Self {
    FlowError::HandlerError { source: err.into() }
  }
}

struct PlainUnit;

#[async_trait::async_trait]
impl txflow::UnitOfWork for PlainUnit {
  type Error = PlainUnitError;
  async fn commit(self) -> Result<(), PlainUnitError> {
    Ok(())
  }
  async fn rollback(self) -> Result<(), PlainUnitError> {
    Ok(())
  }
}

struct PlainSource;

#[async_trait::async_trait]
impl txflow::UnitSource for PlainSource {
  type Unit = PlainUnit;
  async fn begin(&self) -> Result<PlainUnit, PlainUnitError> {
    Ok(PlainUnit)
  }
}

#[tokio::test]
#[serial]
async fn test_flows_with_flow_error_type() {
  setup_tracing();
  let flows: Flows<PlainSource> = Flows::new(Arc::new(PlainSource));

  let mut failing = Pipeline::<TestContext, PlainUnit, FlowError>::new(&[("fail_task", false, None)]);
  failing.on_step("fail_task", |_ctx: ContextData<TestContext>, _unit: UnitHandle<PlainUnit>| async move {
    Err::<PipelineControl, _>(anyhow::anyhow!("Intentional failure"))
  });
  flows.register_pipeline(failing);

  match flows.run(ContextData::new(TestContext::default())).await {
    Err(FlowError::HandlerError { source }) => assert_eq!(source.to_string(), "Intentional failure"),
    other => panic!("Expected FlowError::HandlerError, got {:?}", other),
  }
}
