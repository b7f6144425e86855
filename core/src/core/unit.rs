// txflow/src/core/unit.rs

//! The unit-of-work abstraction a pipeline run executes inside.
//!
//! A `UnitSource` begins units; a `UnitOfWork` is committed or rolled back once
//! the run is over. In practice the source is a connection pool and the unit is
//! a database transaction, but anything with all-or-nothing semantics fits.

use crate::error::FlowError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// An atomic unit of work.
///
/// Implementations MUST discard every write when the value is dropped without
/// `commit` having been called. Early returns with `?` rely on this.
#[async_trait]
pub trait UnitOfWork: Send + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Makes every write performed through this unit visible, atomically.
  async fn commit(self) -> Result<(), Self::Error>;

  /// Discards every write performed through this unit.
  async fn rollback(self) -> Result<(), Self::Error>;
}

/// Something that can begin units of work, e.g. a connection pool.
#[async_trait]
pub trait UnitSource: Send + Sync + 'static {
  type Unit: UnitOfWork;

  async fn begin(&self) -> Result<Self::Unit, UnitError<Self::Unit>>;
}

/// Shorthand for the error type of a unit.
pub type UnitError<U> = <U as UnitOfWork>::Error;

/// Shared handle to the unit of a running pipeline.
///
/// Every handler gets a clone. The lock is an async mutex, so a handler may hold
/// it across the `.await`s of its storage calls.
pub struct UnitHandle<U>(Arc<Mutex<U>>);

impl<U: UnitOfWork> UnitHandle<U> {
  pub fn new(unit: U) -> Self {
    UnitHandle(Arc::new(Mutex::new(unit)))
  }

  /// Locks the unit for exclusive use by the calling handler.
  pub async fn lock(&self) -> MutexGuard<'_, U> {
    self.0.lock().await
  }

  /// Reclaims the unit once every handler has released its clone.
  pub fn into_inner(self) -> Result<U, FlowError> {
    Arc::try_unwrap(self.0)
      .map(Mutex::into_inner)
      .map_err(|_| FlowError::UnitLeaked)
  }
}

impl<U> Clone for UnitHandle<U> {
  fn clone(&self) -> Self {
    UnitHandle(Arc::clone(&self.0))
  }
}

impl<U> std::fmt::Debug for UnitHandle<U> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UnitHandle")
      .field("unit_type", &std::any::type_name::<U>())
      .field("handles", &Arc::strong_count(&self.0))
      .finish()
  }
}
