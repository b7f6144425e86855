pub mod context_data;
pub mod control;
pub mod handler;
pub mod step;
pub mod unit;

// Re-export key types for easier access from other txflow modules (and lib.rs)
pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use handler::Handler;
pub use step::StepDef;
pub use unit::{UnitHandle, UnitOfWork, UnitSource};
