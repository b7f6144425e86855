// tests/catalog_tests.rs
mod common;

use common::*;
use storefront::seed;
use storefront::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_create_get_and_list_products() {
  let app = memory_app();
  let created = app.product("Kettle", 2599, 8).await;

  let fetched = app.state.catalog.get_product(created.id).await.unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.stock, 8);

  app.product("Toaster", 3499, 2).await;
  let names: Vec<String> = app
    .state
    .catalog
    .list_products()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.name)
    .collect();
  assert_eq!(names.len(), 2);
  assert!(names.contains(&"Kettle".to_string()));
  assert!(names.contains(&"Toaster".to_string()));
}

#[tokio::test]
async fn test_invalid_drafts_are_rejected() {
  let app = memory_app();
  for bad in [draft("  ", 100, 1), draft("Negative price", -1, 1), draft("Negative stock", 100, -5)] {
    let err = app.state.catalog.create_product(bad).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  }
  assert!(app.state.catalog.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_product_keeps_identity() {
  let app = memory_app();
  let created = app.product("Mug", 499, 10).await;

  let updated = app.state.catalog.update_product(created.id, draft("Big Mug", 699, 12)).await.unwrap();
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.created_at, created.created_at);
  assert_eq!(updated.name, "Big Mug");
  assert_eq!(app.state.catalog.get_product(created.id).await.unwrap(), updated);

  let err = app
    .state
    .catalog
    .update_product(Uuid::new_v4(), draft("Ghost", 1, 1))
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_product_cascades_to_cart_items() {
  let app = memory_app();
  let user = Uuid::new_v4();
  let doomed = app.product("Discontinued", 100, 5).await;
  let kept = app.product("Evergreen", 100, 5).await;
  app.state.engine.add_to_cart(user, doomed.id, 2).await.unwrap();
  app.state.engine.add_to_cart(user, kept.id, 1).await.unwrap();

  app.state.catalog.delete_product(doomed.id).await.unwrap();

  let view = app.state.engine.view_cart(user).await.unwrap();
  assert_eq!(view.lines.len(), 1);
  assert_eq!(view.lines[0].line.product_id, kept.id);
  assert!(app.state.catalog.get_product(doomed.id).await.unwrap_err().is_not_found());
  assert!(app.state.catalog.delete_product(doomed.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_stock_summary_reports_reservations() {
  let app = memory_app();
  let product = app.product("Chair", 4500, 9).await;
  app.state.engine.add_to_cart(Uuid::new_v4(), product.id, 2).await.unwrap();
  app.state.engine.add_to_cart(Uuid::new_v4(), product.id, 3).await.unwrap();

  let summary = app.state.catalog.stock_summary(product.id).await.unwrap();
  assert_eq!(summary.available, 4);
  assert_eq!(summary.reserved, 5);
}

#[tokio::test]
async fn test_seed_only_fills_an_empty_catalog() {
  let app = memory_app();
  let inserted = seed::seed_catalog(&app.state.catalog).await.unwrap();
  assert!(inserted > 0);
  assert_eq!(app.state.catalog.list_products().await.unwrap().len(), inserted);

  assert_eq!(seed::seed_catalog(&app.state.catalog).await.unwrap(), 0);
  assert_eq!(app.state.catalog.list_products().await.unwrap().len(), inserted);
}
