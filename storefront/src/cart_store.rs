// storefront/src/cart_store.rs

//! Cart store: carts and their items. Knows nothing about stock; keeping the
//! two consistent is the engine's job.
//!
//! Rows are locked cart first, then product, then item. `lock_item` takes all
//! three for an item known only by id.

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CartLine};
use crate::store::StoreTx;
use chrono::Utc;
use uuid::Uuid;

/// The user's cart, created on first use. Repeated calls return the same cart.
pub async fn get_or_create_cart<T: StoreTx>(tx: &mut T, user_id: Uuid) -> Result<Cart> {
  if let Some(cart) = tx.cart_for_user(user_id).await? {
    return Ok(cart);
  }
  let candidate = Cart {
    id: Uuid::new_v4(),
    user_id,
    created_at: Utc::now(),
  };
  tx.insert_cart_if_absent(&candidate).await?;
  // A concurrent creator may have won; read back whichever cart exists.
  tx.cart_for_user(user_id)
    .await?
    .ok_or_else(|| AppError::Internal(format!("Cart of user {} vanished after creation", user_id)))
}

/// Locks the cart row for the rest of the unit.
pub async fn lock_cart<T: StoreTx>(tx: &mut T, cart_id: Uuid) -> Result<Cart> {
  tx.cart_for_update(cart_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart {} not found.", cart_id)))
}

/// Locks the item together with its cart and product rows, in lock order.
/// `None` when the item does not exist, including when it vanished while
/// the locks were being taken.
pub async fn lock_item<T: StoreTx>(tx: &mut T, item_id: Uuid) -> Result<Option<CartItem>> {
  let Some(seen) = tx.cart_item(item_id).await? else {
    return Ok(None);
  };
  lock_cart(tx, seen.cart_id).await?;
  // A product deleted meanwhile took its cart items with it.
  if tx.stock_for_update(seen.product_id).await?.is_none() {
    return Ok(None);
  }
  Ok(tx.cart_item_for_update(item_id).await?)
}

pub async fn get_items<T: StoreTx>(tx: &mut T, cart_id: Uuid) -> Result<Vec<CartLine>> {
  Ok(tx.cart_lines(cart_id).await?)
}

pub async fn item_for_product<T: StoreTx>(tx: &mut T, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
  Ok(tx.cart_item_by_product_for_update(cart_id, product_id).await?)
}

/// Sets the product's quantity in the cart, inserting the item if needed.
/// A quantity of zero or less deletes the item; `None` is returned then.
pub async fn upsert_item<T: StoreTx>(
  tx: &mut T,
  cart_id: Uuid,
  product_id: Uuid,
  quantity: i32,
) -> Result<Option<CartItem>> {
  let existing = tx.cart_item_by_product_for_update(cart_id, product_id).await?;
  match existing {
    Some(item) if quantity <= 0 => {
      tx.delete_cart_item(item.id).await?;
      Ok(None)
    }
    Some(item) => {
      tx.set_cart_item_quantity(item.id, quantity).await?;
      Ok(Some(CartItem { quantity, ..item }))
    }
    None if quantity <= 0 => Ok(None),
    None => {
      let item = CartItem {
        id: Uuid::new_v4(),
        cart_id,
        product_id,
        quantity,
      };
      tx.insert_cart_item(&item).await?;
      Ok(Some(item))
    }
  }
}

/// `false` when the item was already gone.
pub async fn delete_item<T: StoreTx>(tx: &mut T, item_id: Uuid) -> Result<bool> {
  Ok(tx.delete_cart_item(item_id).await?)
}
