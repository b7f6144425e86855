// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;
use txflow::{ContextData, FlowError, PipelineControl, UnitHandle, UnitOfWork, UnitSource};

// --- Common Context Struct ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

// --- A journaling unit of work ---

/// What reached "storage": only writes of committed units land here.
#[derive(Debug, Default)]
pub struct Journal {
  pub committed: Vec<String>,
  pub begun: usize,
  pub commits: usize,
  pub rollbacks: usize,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestUnitError {
  #[error("unit source unavailable")]
  Unavailable,
  #[error("commit rejected")]
  CommitRejected,
}

pub struct TestUnit {
  pub writes: Vec<String>,
  journal: Arc<Mutex<Journal>>,
  fail_commit: bool,
}

#[async_trait]
impl UnitOfWork for TestUnit {
  type Error = TestUnitError;

  async fn commit(self) -> Result<(), TestUnitError> {
    if self.fail_commit {
      return Err(TestUnitError::CommitRejected);
    }
    let mut journal = self.journal.lock();
    journal.commits += 1;
    journal.committed.extend(self.writes);
    Ok(())
  }

  async fn rollback(self) -> Result<(), TestUnitError> {
    self.journal.lock().rollbacks += 1;
    Ok(())
  }
}

#[derive(Default)]
pub struct TestSource {
  pub journal: Arc<Mutex<Journal>>,
  pub fail_begin: AtomicBool,
  pub fail_commit: AtomicBool,
}

impl TestSource {
  pub fn committed(&self) -> Vec<String> {
    self.journal.lock().committed.clone()
  }

  pub fn rollbacks(&self) -> usize {
    self.journal.lock().rollbacks
  }

  pub fn commits(&self) -> usize {
    self.journal.lock().commits
  }
}

#[async_trait]
impl UnitSource for TestSource {
  type Unit = TestUnit;

  async fn begin(&self) -> Result<TestUnit, TestUnitError> {
    if self.fail_begin.load(Ordering::SeqCst) {
      return Err(TestUnitError::Unavailable);
    }
    self.journal.lock().begun += 1;
    Ok(TestUnit {
      writes: Vec::new(),
      journal: Arc::clone(&self.journal),
      fail_commit: self.fail_commit.load(Ordering::SeqCst),
    })
  }
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("txflow framework error: {0}")]
  Flow(String), // Debug-formatted FlowError, so assertions can match on the variant name

  #[error("unit error: {0}")]
  Unit(#[from] TestUnitError),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub type TestHandler = txflow::Handler<TestContext, TestUnit, TestError>;

// --- Common Handler Creators ---

/// Records the step in the context and writes `write` through the unit.
pub fn create_write_handler(step_name: &'static str, write: &'static str) -> TestHandler {
  Box::new(move |ctx: ContextData<TestContext>, unit: UnitHandle<TestUnit>| {
    Box::pin(async move {
      let stop_here = {
        let mut guard = ctx.write();
        guard.counter += 1;
        guard.message.push_str(write);
        guard.steps_executed.push(step_name.to_string());
        guard.should_stop_at.as_deref() == Some(step_name)
      };
      unit.lock().await.writes.push(write.to_string());
      tracing::debug!(target: "test_handlers", step = %step_name, "wrote '{}'", write);
      if stop_here {
        Ok::<_, TestError>(PipelineControl::Stop)
      } else {
        Ok(PipelineControl::Continue)
      }
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> TestHandler {
  Box::new(move |ctx: ContextData<TestContext>, _unit: UnitHandle<TestUnit>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = %step_name, "failing with: '{}'", error_message);
      Err::<PipelineControl, _>(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub static HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
