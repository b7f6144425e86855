// storefront/src/services/catalog.rs

//! Admin catalog operations and stock inspection.

use crate::errors::{AppError, Result};
use crate::models::{Product, ProductDraft, StockSummary};
use crate::store::StoreTx;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use txflow::{UnitOfWork, UnitSource};
use uuid::Uuid;

pub struct CatalogService<S> {
  source: Arc<S>,
}

impl<S> Clone for CatalogService<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
    }
  }
}

fn validate_draft(draft: &ProductDraft) -> Result<()> {
  if draft.name.trim().is_empty() {
    return Err(AppError::Validation("Product name must not be empty.".to_string()));
  }
  if draft.price_cents < 0 {
    return Err(AppError::Validation("Product price must not be negative.".to_string()));
  }
  if draft.stock < 0 {
    return Err(AppError::Validation("Product stock must not be negative.".to_string()));
  }
  Ok(())
}

fn not_found(product_id: Uuid) -> AppError {
  AppError::NotFound(format!("Product with ID {} not found.", product_id))
}

impl<S> CatalogService<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub fn new(source: Arc<S>) -> Self {
    Self { source }
  }

  #[instrument(name = "catalog::create_product", skip(self, draft), fields(name = %draft.name), err(Display))]
  pub async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
    validate_draft(&draft)?;
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: draft.name.trim().to_string(),
      description: draft.description,
      price_cents: draft.price_cents,
      image_url: draft.image_url,
      category: draft.category,
      stock: draft.stock,
      created_at: now,
      updated_at: now,
    };

    let mut tx = self.source.begin().await?;
    tx.insert_product(&product).await?;
    tx.commit().await?;
    info!(product_id = %product.id, stock = product.stock, "Product created.");
    Ok(product)
  }

  /// Replaces the product's catalog fields. Setting `stock` here is an admin
  /// restock and bypasses the ledger.
  #[instrument(name = "catalog::update_product", skip(self, draft), err(Display))]
  pub async fn update_product(&self, product_id: Uuid, draft: ProductDraft) -> Result<Product> {
    validate_draft(&draft)?;
    let mut tx = self.source.begin().await?;
    let existing = tx.product(product_id).await?.ok_or_else(|| not_found(product_id))?;
    let product = Product {
      id: existing.id,
      name: draft.name.trim().to_string(),
      description: draft.description,
      price_cents: draft.price_cents,
      image_url: draft.image_url,
      category: draft.category,
      stock: draft.stock,
      created_at: existing.created_at,
      updated_at: Utc::now(),
    };
    if !tx.update_product(&product).await? {
      return Err(not_found(product_id));
    }
    tx.commit().await?;
    info!(%product_id, "Product updated.");
    Ok(product)
  }

  /// Deletes the product; cart items holding it disappear with it.
  #[instrument(name = "catalog::delete_product", skip(self), err(Display))]
  pub async fn delete_product(&self, product_id: Uuid) -> Result<()> {
    let mut tx = self.source.begin().await?;
    let reserved = tx.reserved_quantity(product_id).await?;
    if !tx.delete_product(product_id).await? {
      return Err(not_found(product_id));
    }
    tx.commit().await?;
    if reserved > 0 {
      warn!(%product_id, reserved, "Deleted product was still reserved in carts.");
    }
    info!(%product_id, "Product deleted.");
    Ok(())
  }

  pub async fn get_product(&self, product_id: Uuid) -> Result<Product> {
    let mut tx = self.source.begin().await?;
    let product = tx.product(product_id).await?.ok_or_else(|| not_found(product_id))?;
    tx.commit().await?;
    Ok(product)
  }

  pub async fn list_products(&self) -> Result<Vec<Product>> {
    let mut tx = self.source.begin().await?;
    let products = tx.list_products().await?;
    tx.commit().await?;
    Ok(products)
  }

  /// Available and reserved units, read in one transaction.
  #[instrument(name = "catalog::stock_summary", skip(self), err(Display))]
  pub async fn stock_summary(&self, product_id: Uuid) -> Result<StockSummary> {
    let mut tx = self.source.begin().await?;
    let product = tx.product(product_id).await?.ok_or_else(|| not_found(product_id))?;
    let reserved = tx.reserved_quantity(product_id).await?;
    tx.commit().await?;
    Ok(StockSummary {
      product_id,
      available: product.stock,
      reserved,
    })
  }
}
