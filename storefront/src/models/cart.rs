// storefront/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::cart_item::CartLine;

/// A user's cart. Created lazily, one per user, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
  #[serde(flatten)]
  pub line: CartLine,
  pub line_total_cents: i64,
}

/// Read projection of a cart: lines priced at current product prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
  pub cart_id: Uuid,
  pub user_id: Uuid,
  pub lines: Vec<PricedLine>,
  pub total_cents: i64,
}

impl CartView {
  pub fn line_for_product(&self, product_id: Uuid) -> Option<&PricedLine> {
    self.lines.iter().find(|l| l.line.product_id == product_id)
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

/// What `clear_cart` gave back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
  pub items_removed: u64,
  pub units_released: i64,
}
