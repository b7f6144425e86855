// tests/store_tests.rs
mod common;

use common::*;
use storefront::{StoreError, StoreTx};
use txflow::UnitSource;
use uuid::Uuid;

/// A user with one cart item of a fresh product; returns (product, item).
async fn app_with_item(app: &TestApp, stock: i32) -> (Uuid, Uuid) {
  let product = app.product("Locked", 100, stock).await;
  let view = app.state.engine.add_to_cart(Uuid::new_v4(), product.id, 1).await.unwrap();
  (product.id, view.lines[0].line.item_id)
}

#[tokio::test]
async fn test_item_lock_before_product_lock_is_rejected() {
  let app = memory_app();
  let (product_id, item_id) = app_with_item(&app, 5).await;

  let mut tx = app.store.begin().await.unwrap();
  assert!(tx.cart_item_for_update(item_id).await.unwrap().is_some());
  let err = tx.stock_for_update(product_id).await.unwrap_err();
  assert!(matches!(err, StoreError::LockOrder(_)), "got {:?}", err);
  assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_products_lock_in_ascending_id_order() {
  let app = memory_app();
  let mut ids = vec![app.product("A", 1, 1).await.id, app.product("B", 1, 1).await.id];
  ids.sort();

  let mut tx = app.store.begin().await.unwrap();
  tx.stock_for_update(ids[0]).await.unwrap();
  tx.stock_for_update(ids[1]).await.unwrap();
  // Re-locking a held row is always allowed.
  tx.stock_for_update(ids[0]).await.unwrap();
  drop(tx);

  let mut tx = app.store.begin().await.unwrap();
  tx.stock_for_update(ids[1]).await.unwrap();
  let err = tx.stock_for_update(ids[0]).await.unwrap_err();
  assert!(matches!(err, StoreError::LockOrder(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_cart_lock_must_come_first() {
  let app = memory_app();
  let user = Uuid::new_v4();
  let product = app.product("Cartless", 100, 3).await;
  let view = app.state.engine.add_to_cart(user, product.id, 1).await.unwrap();

  let mut tx = app.store.begin().await.unwrap();
  tx.stock_for_update(product.id).await.unwrap();
  let err = tx.cart_for_update(view.cart_id).await.unwrap_err();
  assert!(matches!(err, StoreError::LockOrder(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_every_cart_operation_keeps_lock_order() {
  let app = memory_app();
  let engine = &app.state.engine;
  let user = Uuid::new_v4();
  let first = app.product("First", 100, 10).await;
  let second = app.product("Second", 200, 10).await;

  let view = engine.add_to_cart(user, first.id, 2).await.unwrap();
  let item = view.line_for_product(first.id).unwrap().line.item_id;
  engine.add_to_cart(user, second.id, 3).await.unwrap();
  engine.add_to_cart(user, first.id, 1).await.unwrap();
  engine.update_quantity(item, 6).await.unwrap();
  engine.update_quantity(item, 4).await.unwrap();
  engine.remove_item(item).await.unwrap();
  engine.add_to_cart(user, first.id, 1).await.unwrap();
  let outcome = engine.clear_cart(user).await.unwrap();

  assert_eq!((outcome.items_removed, outcome.units_released), (2, 4));
  assert_eq!(app.stock_of(first.id).await, 10);
  assert_eq!(app.stock_of(second.id).await, 10);
}

#[tokio::test]
async fn test_negative_stock_is_a_constraint_violation() {
  let app = memory_app();
  let product = app.product("Bounded", 100, 2).await;

  let mut tx = app.store.begin().await.unwrap();
  let err = tx.set_stock(product.id, -1).await.unwrap_err();
  assert!(matches!(err, StoreError::Constraint(_)), "got {:?}", err);
  assert!(!err.is_retryable());
  drop(tx);

  assert_eq!(app.stock_of(product.id).await, 2);
}
