// txflow/src/pipeline/mod.rs

//! Defines the `Pipeline<TData, U, Err>` struct, its construction, modification, and execution logic.

pub mod definition;
pub mod execution;
pub mod hooks;

// Re-export the main Pipeline struct
pub use definition::Pipeline;
