// storefront/src/store/mod.rs

//! The persistence boundary. Everything the storefront reads or writes goes
//! through a `StoreTx`, i.e. inside one transaction.

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore, MemoryTx};
pub use postgres::{PgStore, PgTx};

use crate::models::{Cart, CartItem, CartLine, Feedback, Product, User};
use async_trait::async_trait;
use thiserror::Error;
use txflow::UnitOfWork;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
  /// The store could not be reached (pool exhausted, connection lost, ...).
  #[error("store unavailable: {0}")]
  Unavailable(String),

  /// The transaction lost against a concurrent one (serialization failure,
  /// deadlock, unique violation).
  #[error("conflicting concurrent write: {0}")]
  Conflict(String),

  /// A write would break a table constraint, e.g. negative stock.
  #[error("constraint violated: {0}")]
  Constraint(String),

  /// Rows were locked out of the global order (cart, then products by id,
  /// then cart items). Raised by the in-memory store, which checks the order.
  #[error("lock order violated: {0}")]
  LockOrder(String),

  #[error("database error: {0}")]
  Database(#[source] sqlx::Error),
}

impl StoreError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, StoreError::Unavailable(_) | StoreError::Conflict(_))
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(err: sqlx::Error) -> Self {
    let code = err.as_database_error().and_then(|db| db.code()).map(|c| c.into_owned());
    // serialization_failure, deadlock_detected, unique_violation
    if let Some("40001" | "40P01" | "23505") = code.as_deref() {
      return StoreError::Conflict(err.to_string());
    }
    // check_violation
    if code.as_deref() == Some("23514") {
      return StoreError::Constraint(err.to_string());
    }
    if matches!(
      err,
      sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed
    ) {
      return StoreError::Unavailable(err.to_string());
    }
    StoreError::Database(err)
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One open storage transaction.
///
/// Reads named `*_for_update` lock what they return until the transaction
/// ends; decisions about stock and cart items are only made on locked rows.
///
/// Locks are taken in one global order: the cart row, then product rows in
/// ascending id, then cart item rows. Re-locking a row already held is fine.
#[async_trait]
pub trait StoreTx: UnitOfWork<Error = StoreError> {
  // --- products ---
  async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;
  /// Replaces every column but `id` and `created_at`. `false` when absent.
  async fn update_product(&mut self, product: &Product) -> StoreResult<bool>;
  /// Deletes the product together with every cart item referencing it.
  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool>;
  async fn product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>>;
  async fn list_products(&mut self) -> StoreResult<Vec<Product>>;

  // --- stock ---
  async fn stock_for_update(&mut self, product_id: Uuid) -> StoreResult<Option<i32>>;
  async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> StoreResult<()>;
  /// Total quantity of the product sitting in carts.
  async fn reserved_quantity(&mut self, product_id: Uuid) -> StoreResult<i64>;

  // --- carts ---
  async fn cart(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>>;
  async fn cart_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Cart>>;
  /// Locks the cart row. Every cart operation takes this lock first, so runs
  /// on one cart are serialized.
  async fn cart_for_update(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>>;
  /// Inserts unless the user already owns a cart.
  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<()>;

  // --- cart items ---
  /// Unlocked read, used to learn which cart and product to lock first.
  async fn cart_item(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>>;
  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>>;
  async fn cart_item_for_update(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>>;
  async fn cart_item_by_product_for_update(&mut self, cart_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartItem>>;
  async fn cart_items_for_update(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>>;
  /// Items of the cart joined with their product, ordered by product name.
  async fn cart_lines(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartLine>>;
  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()>;
  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: i32) -> StoreResult<()>;
  async fn delete_cart_item(&mut self, item_id: Uuid) -> StoreResult<bool>;
  async fn delete_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64>;

  // --- feedback ---
  async fn insert_feedback(&mut self, feedback: &Feedback) -> StoreResult<()>;
  /// Newest first.
  async fn list_feedback(&mut self) -> StoreResult<Vec<Feedback>>;

  // --- users ---
  /// Fails with `Conflict` when the username or email is taken.
  async fn insert_user(&mut self, user: &User) -> StoreResult<()>;
  async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;
  async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
  async fn list_users(&mut self) -> StoreResult<Vec<User>>;
  async fn count_admins(&mut self) -> StoreResult<i64>;
}
