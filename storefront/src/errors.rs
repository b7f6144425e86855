// storefront/src/errors.rs

use crate::store::StoreError;
use thiserror::Error;
use txflow::FlowError;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// The unit read `available` units of `product_id` but needed `requested`.
  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    requested: i32,
    available: i32,
  },

  #[error("Storage Error: {0}")]
  Storage(#[from] StoreError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Internal Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Whether repeating the whole operation may succeed. Only infrastructure
  /// failures qualify; domain outcomes never change on retry.
  pub fn is_retryable(&self) -> bool {
    match self {
      AppError::Storage(e) => e.is_retryable(),
      _ => false,
    }
  }

  pub fn is_insufficient_stock(&self) -> bool {
    matches!(self, AppError::InsufficientStock { .. })
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, AppError::NotFound(_))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
