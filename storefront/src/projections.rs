// storefront/src/projections.rs

//! Read projections. Totals are computed from current prices on every read
//! and never stored.

use crate::cart_store;
use crate::errors::{AppError, Result};
use crate::models::{Cart, CartLine, CartView, PricedLine};
use crate::store::StoreTx;
use uuid::Uuid;

pub fn line_total(price_cents: i64, quantity: i32) -> i64 {
  price_cents * i64::from(quantity)
}

pub fn cart_total(lines: &[CartLine]) -> i64 {
  lines.iter().map(|l| line_total(l.price_cents, l.quantity)).sum()
}

impl CartView {
  pub fn build(cart: &Cart, lines: Vec<CartLine>) -> Self {
    let total_cents = cart_total(&lines);
    let lines = lines
      .into_iter()
      .map(|line| PricedLine {
        line_total_cents: line_total(line.price_cents, line.quantity),
        line,
      })
      .collect();
    CartView {
      cart_id: cart.id,
      user_id: cart.user_id,
      lines,
      total_cents,
    }
  }
}

/// Loads the cart and its lines and prices them.
pub async fn cart_view<T: StoreTx>(tx: &mut T, cart_id: Uuid) -> Result<CartView> {
  let cart = tx
    .cart(cart_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart {} not found.", cart_id)))?;
  let lines = cart_store::get_items(tx, cart.id).await?;
  Ok(CartView::build(&cart, lines))
}
