// storefront/src/pipelines/common_steps.rs

//! Steps shared by several cart pipelines.

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::pipelines::contexts::{OwnsCart, ProjectsCart};
use crate::projections;
use crate::store::StoreTx;
use tracing::{debug, instrument};
use txflow::{ContextData, PipelineControl, UnitHandle};

/// Error for a step that finds state an earlier step should have set.
pub(crate) fn missing_state(field: &str) -> AppError {
  AppError::Internal(format!("Pipeline state '{}' was not set by an earlier step.", field))
}

/// Looks up the user's cart, creating it on first use.
#[instrument(name = "common_step::resolve_cart", skip_all, err(Display))]
pub async fn resolve_cart_step<C, T>(ctx: ContextData<C>, unit: UnitHandle<T>) -> Result<PipelineControl>
where
  C: OwnsCart,
  T: StoreTx,
{
  let user_id = ctx.read().user_id();
  let cart = {
    let mut tx = unit.lock().await;
    cart_store::get_or_create_cart(&mut *tx, user_id).await?
  };
  debug!(%user_id, cart_id = %cart.id, "Cart resolved.");
  ctx.write().set_cart(cart);
  Ok(PipelineControl::Continue)
}

/// Prices the cart as it stands inside the unit, i.e. after this run's writes.
#[instrument(name = "common_step::project_cart", skip_all, err(Display))]
pub async fn project_cart_step<C, T>(ctx: ContextData<C>, unit: UnitHandle<T>) -> Result<PipelineControl>
where
  C: ProjectsCart,
  T: StoreTx,
{
  let cart_id = ctx.read().projected_cart_id();
  let Some(cart_id) = cart_id else {
    debug!("No cart to project.");
    return Ok(PipelineControl::Continue);
  };
  let view = {
    let mut tx = unit.lock().await;
    projections::cart_view(&mut *tx, cart_id).await?
  };
  debug!(%cart_id, lines = view.lines.len(), total_cents = view.total_cents, "Cart projected.");
  ctx.write().set_view(view);
  Ok(PipelineControl::Continue)
}
