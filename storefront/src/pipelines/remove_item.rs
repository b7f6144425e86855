// storefront/src/pipelines/remove_item.rs

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::ledger;
use crate::pipelines::common_steps::{missing_state, project_cart_step};
use crate::pipelines::contexts::RemoveItemCtxData;
use crate::store::StoreTx;
use tracing::{info, instrument};
use txflow::{ContextData, Pipeline, PipelineControl, UnitHandle};

pub fn remove_item_pipeline<T: StoreTx>() -> Pipeline<RemoveItemCtxData, T, AppError> {
  let mut p = Pipeline::<RemoveItemCtxData, T, AppError>::new(&[
    ("lock_item", false, None),
    ("release_stock", false, None),
    ("project_cart", false, None),
  ]);

  p.on_step("lock_item", lock_item::<T>);
  p.on_step("release_stock", release_stock::<T>);
  p.on_step("project_cart", project_cart_step::<RemoveItemCtxData, T>);
  p
}

/// A missing item means it was already removed; the run stops successfully.
#[instrument(name = "remove_item::lock_item", skip_all, err(Display))]
async fn lock_item<T: StoreTx>(ctx: ContextData<RemoveItemCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let item_id = ctx.read().item_id;
  let item = {
    let mut tx = unit.lock().await;
    cart_store::lock_item(&mut *tx, item_id).await?
  };
  match item {
    Some(item) => {
      ctx.write().removed = Some(item);
      Ok(PipelineControl::Continue)
    }
    None => {
      info!(%item_id, "Remove item: already absent.");
      Ok(PipelineControl::Stop)
    }
  }
}

#[instrument(name = "remove_item::release_stock", skip_all, err(Display))]
async fn release_stock<T: StoreTx>(ctx: ContextData<RemoveItemCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let item = ctx.read().removed.clone();
  let item = item.ok_or_else(|| missing_state("removed"))?;

  let mut tx = unit.lock().await;
  ledger::increment(&mut *tx, item.product_id, item.quantity).await?;
  cart_store::delete_item(&mut *tx, item.id).await?;
  info!(item_id = %item.id, product_id = %item.product_id, released = item.quantity, "Remove item: stock released.");
  Ok(PipelineControl::Continue)
}
