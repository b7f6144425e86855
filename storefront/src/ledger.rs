// storefront/src/ledger.rs

//! Stock ledger: the per-product availability counter.
//!
//! Only called from inside a unit of work. Every read locks the product row,
//! so the figure a caller decides on cannot move until the unit ends.

use crate::errors::{AppError, Result};
use crate::store::StoreTx;
use tracing::{debug, warn};
use uuid::Uuid;

/// Current stock of the product, locked for the rest of the unit.
pub async fn get_stock<T: StoreTx>(tx: &mut T, product_id: Uuid) -> Result<i32> {
  tx.stock_for_update(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))
}

/// Takes `amount` units out of stock. Never clamps: asking for more than is
/// available fails with `InsufficientStock` and writes nothing.
pub async fn decrement<T: StoreTx>(tx: &mut T, product_id: Uuid, amount: i32) -> Result<i32> {
  ensure_non_negative(amount)?;
  let stock = get_stock(tx, product_id).await?;
  if amount > stock {
    warn!(%product_id, requested = amount, available = stock, "Insufficient stock.");
    return Err(AppError::InsufficientStock {
      product_id,
      requested: amount,
      available: stock,
    });
  }
  let remaining = stock - amount;
  tx.set_stock(product_id, remaining).await?;
  debug!(%product_id, amount, remaining, "Stock decremented.");
  Ok(remaining)
}

/// Returns `amount` units to stock.
pub async fn increment<T: StoreTx>(tx: &mut T, product_id: Uuid, amount: i32) -> Result<i32> {
  ensure_non_negative(amount)?;
  let stock = get_stock(tx, product_id).await?;
  let restored = stock
    .checked_add(amount)
    .ok_or_else(|| AppError::Internal(format!("Stock of product {} overflows", product_id)))?;
  tx.set_stock(product_id, restored).await?;
  debug!(%product_id, amount, restored, "Stock incremented.");
  Ok(restored)
}

fn ensure_non_negative(amount: i32) -> Result<()> {
  if amount < 0 {
    return Err(AppError::Validation(format!("Stock adjustment must not be negative, got {}.", amount)));
  }
  Ok(())
}
