// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub category: Option<String>,
  /// Units still available; quantity sitting in carts is already subtracted.
  pub stock: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Admin input for creating or replacing a product's catalog fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub stock: i32,
}

/// Where a product's units currently are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockSummary {
  pub product_id: Uuid,
  pub available: i32,
  pub reserved: i64,
}
