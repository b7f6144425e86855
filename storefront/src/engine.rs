// storefront/src/engine.rs

//! The cart transaction engine: the public face of the cart pipelines.
//!
//! Every operation runs as one unit of work. It either commits both its stock
//! and cart changes or leaves the store exactly as it found it.

use crate::errors::{AppError, Result};
use crate::models::{CartView, ClearOutcome};
use crate::pipelines::{self, contexts::*};
use crate::store::StoreTx;
use std::sync::Arc;
use tracing::{instrument, warn};
use txflow::{ContextData, Flows, UnitSource};
use uuid::Uuid;

pub struct CartEngine<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  flows: Arc<Flows<S, AppError>>,
}

impl<S> Clone for CartEngine<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  fn clone(&self) -> Self {
    Self {
      flows: Arc::clone(&self.flows),
    }
  }
}

fn missing_view(operation: &str) -> AppError {
  AppError::Internal(format!("{} finished without projecting the cart.", operation))
}

impl<S> CartEngine<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub fn new(source: Arc<S>) -> Self {
    let flows = Flows::new(source);
    pipelines::register_all_pipelines(&flows);
    Self { flows: Arc::new(flows) }
  }

  /// Reserves `quantity` more units of the product in the user's cart.
  #[instrument(name = "CartEngine::add_to_cart", skip(self), err(Display))]
  pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartView> {
    // Rejected before a unit is begun.
    if quantity <= 0 {
      warn!(quantity, "Add to cart: quantity must be positive.");
      return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
    }
    let ctx = ContextData::new(AddToCartCtxData::new(user_id, product_id, quantity));
    self.flows.run(ctx.clone()).await?;
    let view = ctx.read().view.clone();
    view.ok_or_else(|| missing_view("add_to_cart"))
  }

  /// Sets the item's quantity, moving the difference into or out of stock.
  /// Zero removes the item. Returns the owning cart.
  #[instrument(name = "CartEngine::update_quantity", skip(self), err(Display))]
  pub async fn update_quantity(&self, item_id: Uuid, new_quantity: i32) -> Result<CartView> {
    if new_quantity < 0 {
      warn!(new_quantity, "Update quantity: quantity must not be negative.");
      return Err(AppError::Validation("Quantity must not be negative.".to_string()));
    }
    let ctx = ContextData::new(UpdateQuantityCtxData::new(item_id, new_quantity));
    self.flows.run(ctx.clone()).await?;
    let view = ctx.read().view.clone();
    view.ok_or_else(|| missing_view("update_quantity"))
  }

  /// Removes the item and returns its quantity to stock. `None` when the item
  /// no longer exists, which is not an error.
  #[instrument(name = "CartEngine::remove_item", skip(self), err(Display))]
  pub async fn remove_item(&self, item_id: Uuid) -> Result<Option<CartView>> {
    let ctx = ContextData::new(RemoveItemCtxData::new(item_id));
    self.flows.run(ctx.clone()).await?;
    let guard = ctx.read();
    match (&guard.removed, &guard.view) {
      (None, _) => Ok(None),
      (Some(_), Some(view)) => Ok(Some(view.clone())),
      (Some(_), None) => Err(missing_view("remove_item")),
    }
  }

  /// Empties the user's cart and restocks everything it held. The cart itself
  /// stays. Safe to repeat.
  #[instrument(name = "CartEngine::clear_cart", skip(self), err(Display))]
  pub async fn clear_cart(&self, user_id: Uuid) -> Result<ClearOutcome> {
    let ctx = ContextData::new(ClearCartCtxData::new(user_id));
    self.flows.run(ctx.clone()).await?;
    let outcome = ctx.read().outcome;
    Ok(outcome)
  }

  #[instrument(name = "CartEngine::view_cart", skip(self), err(Display))]
  pub async fn view_cart(&self, user_id: Uuid) -> Result<CartView> {
    let ctx = ContextData::new(ViewCartCtxData::new(user_id));
    self.flows.run(ctx.clone()).await?;
    let view = ctx.read().view.clone();
    view.ok_or_else(|| missing_view("view_cart"))
  }
}
