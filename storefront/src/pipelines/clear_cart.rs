// storefront/src/pipelines/clear_cart.rs

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::ledger;
use crate::pipelines::common_steps::missing_state;
use crate::pipelines::contexts::ClearCartCtxData;
use crate::store::StoreTx;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};
use txflow::{ContextData, Pipeline, PipelineControl, UnitHandle};
use uuid::Uuid;

pub fn clear_cart_pipeline<T: StoreTx>() -> Pipeline<ClearCartCtxData, T, AppError> {
  let mut p = Pipeline::<ClearCartCtxData, T, AppError>::new(&[
    ("locate_cart", false, None),
    ("release_reservations", false, None),
    ("delete_items", false, None),
  ]);

  p.on_step("locate_cart", locate_cart::<T>);
  p.on_step("release_reservations", release_reservations::<T>);
  p.on_step("delete_items", delete_items::<T>);
  p
}

/// Clearing never creates a cart; a user without one has nothing to clear.
#[instrument(name = "clear_cart::locate_cart", skip_all, err(Display))]
async fn locate_cart<T: StoreTx>(ctx: ContextData<ClearCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let user_id = ctx.read().user_id;
  let cart = {
    let mut tx = unit.lock().await;
    let found = tx.cart_for_user(user_id).await?;
    match found {
      Some(cart) => Some(cart_store::lock_cart(&mut *tx, cart.id).await?),
      None => None,
    }
  };
  match cart {
    Some(cart) => {
      ctx.write().cart = Some(cart);
      Ok(PipelineControl::Continue)
    }
    None => {
      info!(%user_id, "Clear cart: user has no cart.");
      Ok(PipelineControl::Stop)
    }
  }
}

#[instrument(name = "clear_cart::release_reservations", skip_all, err(Display))]
async fn release_reservations<T: StoreTx>(ctx: ContextData<ClearCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let cart_id = ctx.read().cart.as_ref().map(|c| c.id);
  let cart_id = cart_id.ok_or_else(|| missing_state("cart"))?;

  let mut tx = unit.lock().await;
  // Product rows are locked before the items, in id order. With the cart
  // locked no item can be added meanwhile; a concurrent product deletion can
  // only take items away.
  let seen = tx.cart_items(cart_id).await?;
  let product_ids: BTreeSet<Uuid> = seen.iter().map(|item| item.product_id).collect();
  for product_id in &product_ids {
    tx.stock_for_update(*product_id).await?;
  }
  let items = tx.cart_items_for_update(cart_id).await?;

  let mut per_product: BTreeMap<Uuid, i32> = BTreeMap::new();
  for item in &items {
    let total = per_product.entry(item.product_id).or_insert(0);
    *total = total
      .checked_add(item.quantity)
      .ok_or_else(|| AppError::Internal(format!("Reserved quantity of product {} overflows", item.product_id)))?;
  }

  let mut units_released: i64 = 0;
  for (product_id, quantity) in per_product {
    ledger::increment(&mut *tx, product_id, quantity).await?;
    units_released += i64::from(quantity);
  }
  drop(tx);

  ctx.write().outcome.units_released = units_released;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "clear_cart::delete_items", skip_all, err(Display))]
async fn delete_items<T: StoreTx>(ctx: ContextData<ClearCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let cart_id = ctx.read().cart.as_ref().map(|c| c.id);
  let cart_id = cart_id.ok_or_else(|| missing_state("cart"))?;

  let items_removed = {
    let mut tx = unit.lock().await;
    tx.delete_cart_items(cart_id).await?
  };

  let outcome = {
    let mut guard = ctx.write();
    guard.outcome.items_removed = items_removed;
    guard.outcome
  };
  info!(%cart_id, items_removed, units_released = outcome.units_released, "Clear cart: done.");
  Ok(PipelineControl::Continue)
}
