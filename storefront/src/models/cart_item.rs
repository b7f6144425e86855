// storefront/src/models/cart_item.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One product line of a cart. At most one exists per (cart, product) and its
/// quantity is always positive; a line brought to zero is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
}

/// A cart item joined with the product fields a shopper sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CartLine {
  pub item_id: Uuid,
  pub product_id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub quantity: i32,
}
