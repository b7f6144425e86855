// storefront/src/pipelines/update_quantity.rs

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::ledger;
use crate::pipelines::common_steps::{missing_state, project_cart_step};
use crate::pipelines::contexts::UpdateQuantityCtxData;
use crate::store::StoreTx;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};
use txflow::{ContextData, Pipeline, PipelineControl, UnitHandle};

pub fn update_quantity_pipeline<T: StoreTx>() -> Pipeline<UpdateQuantityCtxData, T, AppError> {
  let mut p = Pipeline::<UpdateQuantityCtxData, T, AppError>::new(&[
    ("lock_item", false, None),
    ("apply_delta", false, None),
    ("project_cart", false, None),
  ]);

  p.on_step("lock_item", lock_item::<T>);
  p.on_step("apply_delta", apply_delta::<T>);
  p.on_step("project_cart", project_cart_step::<UpdateQuantityCtxData, T>);
  p
}

#[instrument(name = "update_quantity::lock_item", skip_all, err(Display))]
async fn lock_item<T: StoreTx>(ctx: ContextData<UpdateQuantityCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let item_id = ctx.read().item_id;
  let item = {
    let mut tx = unit.lock().await;
    cart_store::lock_item(&mut *tx, item_id).await?
  };
  let item = item.ok_or_else(|| AppError::NotFound(format!("Cart item {} not found.", item_id)))?;
  ctx.write().item = Some(item);
  Ok(PipelineControl::Continue)
}

/// Moves the difference between the old and new quantity into or out of stock.
#[instrument(name = "update_quantity::apply_delta", skip_all, err(Display))]
async fn apply_delta<T: StoreTx>(ctx: ContextData<UpdateQuantityCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let (item, new_quantity) = {
    let guard = ctx.read();
    (guard.item.clone(), guard.new_quantity)
  };
  let item = item.ok_or_else(|| missing_state("item"))?;
  // The engine rejects negative quantities, so this cannot overflow.
  let delta = new_quantity - item.quantity;

  let mut tx = unit.lock().await;
  match delta.cmp(&0) {
    Ordering::Less => {
      ledger::increment(&mut *tx, item.product_id, -delta).await?;
      cart_store::upsert_item(&mut *tx, item.cart_id, item.product_id, new_quantity).await?;
      info!(item_id = %item.id, released = -delta, new_quantity, "Update quantity: stock released.");
    }
    Ordering::Greater => {
      let stock = ledger::get_stock(&mut *tx, item.product_id).await?;
      if delta > stock {
        warn!(item_id = %item.id, requested = delta, available = stock, "Update quantity: insufficient stock.");
        return Err(AppError::InsufficientStock {
          product_id: item.product_id,
          requested: delta,
          available: stock,
        });
      }
      ledger::decrement(&mut *tx, item.product_id, delta).await?;
      cart_store::upsert_item(&mut *tx, item.cart_id, item.product_id, new_quantity).await?;
      info!(item_id = %item.id, reserved = delta, new_quantity, "Update quantity: stock reserved.");
    }
    Ordering::Equal => debug!(item_id = %item.id, "Update quantity: unchanged."),
  }
  Ok(PipelineControl::Continue)
}
