// txflow/src/core/handler.rs

//! Defines the `Handler<TData, U, Err>` type for pipeline step handlers.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::unit::UnitHandle;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// A handler is an asynchronous function that takes a clone of the run's
/// `ContextData<TData>` and a clone of the run's `UnitHandle<U>`, and resolves to
/// `Result<PipelineControl, Err>`.
///
/// Handlers are responsible for:
/// 1. Locking the context (`.read()` / `.write()`) only between `.await` points.
/// 2. Locking the unit (`unit.lock().await`) for every read and write that must
///    belong to the atomic unit.
/// 3. Dropping their unit handle before returning. A handle that outlives the run
///    prevents the commit.
pub type Handler<TData, U, Err> = Box<
  dyn Fn(ContextData<TData>, UnitHandle<U>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
