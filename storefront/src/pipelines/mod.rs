// storefront/src/pipelines/mod.rs

//! Defines and registers the cart transaction pipelines. Each engine operation
//! is one pipeline, and each run is one unit of work.

use crate::errors::AppError;
use crate::store::StoreTx;
use txflow::{Flows, UnitSource};

pub mod common_steps;
pub mod contexts;

pub mod add_to_cart;
pub mod clear_cart;
pub mod remove_item;
pub mod update_quantity;
pub mod view_cart;

/// Registers every cart pipeline with the registry.
///
/// Called once when the engine is built.
pub fn register_all_pipelines<S>(flows: &Flows<S, AppError>)
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  flows.register_pipeline(add_to_cart::add_to_cart_pipeline::<S::Unit>());
  flows.register_pipeline(update_quantity::update_quantity_pipeline::<S::Unit>());
  flows.register_pipeline(remove_item::remove_item_pipeline::<S::Unit>());
  flows.register_pipeline(clear_cart::clear_cart_pipeline::<S::Unit>());
  flows.register_pipeline(view_cart::view_cart_pipeline::<S::Unit>());
  tracing::info!("Cart pipelines registered.");
}
