// storefront/src/pipelines/add_to_cart.rs

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::ledger;
use crate::pipelines::common_steps::{missing_state, project_cart_step, resolve_cart_step};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::store::StoreTx;
use tracing::{info, instrument, warn};
use txflow::{ContextData, Pipeline, PipelineControl, UnitHandle};

pub fn add_to_cart_pipeline<T: StoreTx>() -> Pipeline<AddToCartCtxData, T, AppError> {
  let mut p = Pipeline::<AddToCartCtxData, T, AppError>::new(&[
    ("resolve_cart", false, None),
    ("lock_cart", false, None),
    ("read_stock", false, None),
    ("check_cart_total", false, None),
    ("reserve_and_upsert", false, None),
    ("project_cart", false, None),
  ]);

  p.on_step("resolve_cart", resolve_cart_step::<AddToCartCtxData, T>);
  p.on_step("lock_cart", lock_cart::<T>);
  p.on_step("read_stock", read_stock::<T>);
  p.on_step("check_cart_total", check_cart_total::<T>);
  p.on_step("reserve_and_upsert", reserve_and_upsert::<T>);
  p.on_step("project_cart", project_cart_step::<AddToCartCtxData, T>);
  p
}

/// Serializes runs on this cart before any product row is locked.
#[instrument(name = "add_to_cart::lock_cart", skip_all, err(Display))]
async fn lock_cart<T: StoreTx>(ctx: ContextData<AddToCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let cart_id = ctx.read().cart.as_ref().map(|c| c.id);
  let cart_id = cart_id.ok_or_else(|| missing_state("cart"))?;
  let cart = {
    let mut tx = unit.lock().await;
    cart_store::lock_cart(&mut *tx, cart_id).await?
  };
  ctx.write().cart = Some(cart);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "add_to_cart::read_stock", skip_all, err(Display))]
async fn read_stock<T: StoreTx>(ctx: ContextData<AddToCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let (product_id, quantity) = {
    let guard = ctx.read();
    (guard.product_id, guard.quantity)
  };

  let stock = {
    let mut tx = unit.lock().await;
    ledger::get_stock(&mut *tx, product_id).await?
  };

  if quantity > stock {
    warn!(%product_id, requested = quantity, available = stock, "Add to cart: insufficient stock.");
    return Err(AppError::InsufficientStock {
      product_id,
      requested: quantity,
      available: stock,
    });
  }
  ctx.write().stock_read = Some(stock);
  Ok(PipelineControl::Continue)
}

/// The product's total in the cart after the add may not exceed the stock read
/// at the start of the unit.
#[instrument(name = "add_to_cart::check_cart_total", skip_all, err(Display))]
async fn check_cart_total<T: StoreTx>(ctx: ContextData<AddToCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let (product_id, quantity, stock_read, cart_id) = {
    let guard = ctx.read();
    (guard.product_id, guard.quantity, guard.stock_read, guard.cart.as_ref().map(|c| c.id))
  };
  let stock = stock_read.ok_or_else(|| missing_state("stock_read"))?;
  let cart_id = cart_id.ok_or_else(|| missing_state("cart"))?;

  let existing = {
    let mut tx = unit.lock().await;
    cart_store::item_for_product(&mut *tx, cart_id, product_id).await?
  };
  let in_cart = existing.map_or(0, |item| item.quantity);
  let new_total = in_cart
    .checked_add(quantity)
    .ok_or_else(|| AppError::Validation("Quantity is too large.".to_string()))?;

  if new_total > stock {
    warn!(%product_id, in_cart, requested = quantity, available = stock, "Add to cart: cart total exceeds stock.");
    return Err(AppError::InsufficientStock {
      product_id,
      requested: new_total,
      available: stock,
    });
  }
  ctx.write().new_total = Some(new_total);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "add_to_cart::reserve_and_upsert", skip_all, err(Display))]
async fn reserve_and_upsert<T: StoreTx>(ctx: ContextData<AddToCartCtxData>, unit: UnitHandle<T>) -> Result<PipelineControl> {
  let (user_id, product_id, quantity, new_total, cart_id) = {
    let guard = ctx.read();
    (
      guard.user_id,
      guard.product_id,
      guard.quantity,
      guard.new_total,
      guard.cart.as_ref().map(|c| c.id),
    )
  };
  let new_total = new_total.ok_or_else(|| missing_state("new_total"))?;
  let cart_id = cart_id.ok_or_else(|| missing_state("cart"))?;

  let mut tx = unit.lock().await;
  let remaining = ledger::decrement(&mut *tx, product_id, quantity).await?;
  cart_store::upsert_item(&mut *tx, cart_id, product_id, new_total).await?;
  info!(%user_id, %product_id, quantity, new_total, remaining, "Add to cart: stock reserved.");
  Ok(PipelineControl::Continue)
}
