// txflow/src/lib.rs

//! txflow: asynchronous, type-safe step pipelines that run inside one atomic unit of work.
//!
//! A pipeline is an ordered list of named steps. Each step may carry `before`,
//! `on` and `after` handlers. Every handler receives the shared pipeline context
//! and a handle to the unit of work (typically a database transaction) that the
//! whole run executes in. Features:
//!  - Named steps with before/on/after hooks.
//!  - Asynchronous handlers for I/O-bound operations.
//!  - Early, successful stopping of a run (`PipelineControl::Stop`).
//!  - Skip conditions and optional steps.
//!  - Atomic execution: commit when the run finishes, rollback when any handler fails.
//!  - A type-keyed registry (`Flows`) that owns the unit source and dispatches runs.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::core::unit::{UnitError, UnitHandle, UnitOfWork, UnitSource};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flows;

/*
    Core Workflow:
    1. Define a context struct `MyCtx` holding the inputs and outputs of one operation.
    2. Implement `UnitOfWork` for your transaction type and `UnitSource` for whatever begins it.
    3. Create a `Pipeline<MyCtx, MyUnit, MyError>` with its step names.
    4. Register handlers with `.on_step()`, `.before_step()`, `.after_step()`.
       Each handler locks the `UnitHandle` to read and write through the transaction.
    5. Register the pipeline with a `Flows` registry built around your unit source.
    6. Call `flows.run(ContextData::new(my_ctx)).await`; the run commits or rolls back as one unit.
*/
