// storefront/src/pipelines/contexts.rs

//! Defines the data structs the cart pipelines run on.
//! Handlers receive these wrapped in `txflow::ContextData`.

use crate::models::{Cart, CartItem, CartView, ClearOutcome};
use uuid::Uuid;

/// Implemented by contexts whose run works on the cart of a user.
pub trait OwnsCart: Send + Sync + 'static {
  fn user_id(&self) -> Uuid;
  fn set_cart(&mut self, cart: Cart);
}

/// Implemented by contexts whose run ends by projecting a cart.
pub trait ProjectsCart: Send + Sync + 'static {
  /// `None` when there is nothing to project.
  fn projected_cart_id(&self) -> Option<Uuid>;
  fn set_view(&mut self, view: CartView);
}

#[derive(Debug, Clone)]
pub struct AddToCartCtxData {
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Stock as read (and locked) at the start of the unit.
  pub stock_read: Option<i32>,
  pub cart: Option<Cart>,
  /// Quantity of the product in the cart once the add is applied.
  pub new_total: Option<i32>,
  pub view: Option<CartView>,
}

impl AddToCartCtxData {
  pub fn new(user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      user_id,
      product_id,
      quantity,
      stock_read: None,
      cart: None,
      new_total: None,
      view: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct UpdateQuantityCtxData {
  pub item_id: Uuid,
  pub new_quantity: i32,
  pub item: Option<CartItem>,
  pub view: Option<CartView>,
}

impl UpdateQuantityCtxData {
  pub fn new(item_id: Uuid, new_quantity: i32) -> Self {
    Self {
      item_id,
      new_quantity,
      item: None,
      view: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct RemoveItemCtxData {
  pub item_id: Uuid,
  /// The item as it was before removal; `None` if it did not exist.
  pub removed: Option<CartItem>,
  pub view: Option<CartView>,
}

impl RemoveItemCtxData {
  pub fn new(item_id: Uuid) -> Self {
    Self {
      item_id,
      removed: None,
      view: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ClearCartCtxData {
  pub user_id: Uuid,
  pub cart: Option<Cart>,
  pub outcome: ClearOutcome,
}

impl ClearCartCtxData {
  pub fn new(user_id: Uuid) -> Self {
    Self {
      user_id,
      cart: None,
      outcome: ClearOutcome::default(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ViewCartCtxData {
  pub user_id: Uuid,
  pub cart: Option<Cart>,
  pub view: Option<CartView>,
}

impl ViewCartCtxData {
  pub fn new(user_id: Uuid) -> Self {
    Self {
      user_id,
      cart: None,
      view: None,
    }
  }
}

impl OwnsCart for AddToCartCtxData {
  fn user_id(&self) -> Uuid {
    self.user_id
  }
  fn set_cart(&mut self, cart: Cart) {
    self.cart = Some(cart);
  }
}

impl OwnsCart for ViewCartCtxData {
  fn user_id(&self) -> Uuid {
    self.user_id
  }
  fn set_cart(&mut self, cart: Cart) {
    self.cart = Some(cart);
  }
}

impl ProjectsCart for AddToCartCtxData {
  fn projected_cart_id(&self) -> Option<Uuid> {
    self.cart.as_ref().map(|c| c.id)
  }
  fn set_view(&mut self, view: CartView) {
    self.view = Some(view);
  }
}

impl ProjectsCart for UpdateQuantityCtxData {
  fn projected_cart_id(&self) -> Option<Uuid> {
    self.item.as_ref().map(|i| i.cart_id)
  }
  fn set_view(&mut self, view: CartView) {
    self.view = Some(view);
  }
}

impl ProjectsCart for RemoveItemCtxData {
  fn projected_cart_id(&self) -> Option<Uuid> {
    self.removed.as_ref().map(|i| i.cart_id)
  }
  fn set_view(&mut self, view: CartView) {
    self.view = Some(view);
  }
}

impl ProjectsCart for ViewCartCtxData {
  fn projected_cart_id(&self) -> Option<Uuid> {
    self.cart.as_ref().map(|c| c.id)
  }
  fn set_view(&mut self, view: CartView) {
    self.view = Some(view);
  }
}
