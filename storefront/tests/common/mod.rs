// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use once_cell::sync::Lazy;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::models::{Product, ProductDraft};
use storefront::{AppState, MemoryStore};
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_config() -> Arc<AppConfig> {
  let config = AppConfig::from_lookup(|name| match name {
    "DATABASE_URL" => Some("postgres://storefront@localhost/storefront_test".to_string()),
    _ => None,
  })
  .expect("test config is valid");
  Arc::new(config)
}

pub struct TestApp {
  pub store: Arc<MemoryStore>,
  pub state: AppState<MemoryStore>,
}

pub fn memory_app() -> TestApp {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let state = AppState::new(Arc::clone(&store), test_config());
  TestApp { store, state }
}

pub fn draft(name: &str, price_cents: i64, stock: i32) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    description: Some(format!("{} description", name)),
    price_cents,
    image_url: None,
    category: Some("Test".to_string()),
    stock,
  }
}

impl TestApp {
  pub async fn product(&self, name: &str, price_cents: i64, stock: i32) -> Product {
    self
      .state
      .catalog
      .create_product(draft(name, price_cents, stock))
      .await
      .expect("product is created")
  }

  pub async fn stock_of(&self, product_id: Uuid) -> i32 {
    self.state.catalog.stock_summary(product_id).await.unwrap().available
  }

  /// Available plus reserved units; constant between admin restocks.
  pub async fn accounted_units(&self, product_id: Uuid) -> i64 {
    let summary = self.state.catalog.stock_summary(product_id).await.unwrap();
    i64::from(summary.available) + summary.reserved
  }

  pub async fn quantity_in_cart(&self, user_id: Uuid, product_id: Uuid) -> Option<i32> {
    let view = self.state.engine.view_cart(user_id).await.unwrap();
    view.line_for_product(product_id).map(|l| l.line.quantity)
  }
}
