// storefront/src/seed.rs

//! Demo catalog for fresh databases.

use crate::errors::Result;
use crate::models::ProductDraft;
use crate::services::CatalogService;
use crate::store::StoreTx;
use tracing::info;
use txflow::UnitSource;

fn demo_products() -> Vec<ProductDraft> {
  let item = |name: &str, description: &str, price_cents: i64, category: &str, stock: i32| ProductDraft {
    name: name.to_string(),
    description: Some(description.to_string()),
    price_cents,
    image_url: Some(format!("/static/images/{}.jpg", name.to_lowercase().replace(' ', "_"))),
    category: Some(category.to_string()),
    stock,
  };
  vec![
    item("Margherita Pizza", "Tomato, mozzarella and basil.", 1199, "Pizza", 25),
    item("Pepperoni Pizza", "Tomato, mozzarella and pepperoni.", 1399, "Pizza", 20),
    item("Caesar Salad", "Romaine, parmesan and croutons.", 899, "Salads", 15),
    item("Garlic Bread", "Toasted with garlic butter.", 499, "Sides", 40),
    item("Tiramisu", "Coffee-soaked ladyfingers and mascarpone.", 699, "Desserts", 10),
    item("Lemonade", "Freshly squeezed.", 349, "Drinks", 50),
  ]
}

/// Inserts the demo catalog when no product exists yet. Returns how many
/// products were created.
pub async fn seed_catalog<S>(catalog: &CatalogService<S>) -> Result<usize>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  if !catalog.list_products().await?.is_empty() {
    info!("Catalog already populated; skipping seed.");
    return Ok(0);
  }
  let drafts = demo_products();
  let count = drafts.len();
  for draft in drafts {
    catalog.create_product(draft).await?;
  }
  info!(count, "Demo catalog seeded.");
  Ok(count)
}
